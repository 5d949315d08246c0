//! Kernel framebuffer screen info structures
//!
//! These mirror `struct fb_var_screeninfo` and `struct fb_fix_screeninfo`
//! from `linux/fb.h` and are passed directly to the fbdev ioctls.

use core::fmt;

/// `FBIOGET_VSCREENINFO`
pub const FBIOGET_VSCREENINFO: u32 = 0x4600;
/// `FBIOPUT_VSCREENINFO`
pub const FBIOPUT_VSCREENINFO: u32 = 0x4601;
/// `FBIOGET_FSCREENINFO`
pub const FBIOGET_FSCREENINFO: u32 = 0x4602;
/// `FBIOBLANK`
pub const FBIOBLANK: u32 = 0x4611;

/// Apply the mode change immediately
pub const FB_ACTIVATE_NOW: u32 = 0;

/// Color channel position within a pixel
/// Matches struct fb_bitfield
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FbBitfield {
    /// Bit offset of the channel
    pub offset: u32,
    /// Channel width in bits
    pub length: u32,
    /// Nonzero if the most significant bit is on the right
    pub msb_right: u32,
}

impl FbBitfield {
    /// Channel at `offset` spanning `length` bits
    pub const fn new(offset: u32, length: u32) -> Self {
        Self {
            offset,
            length,
            msb_right: 0,
        }
    }
}

/// Variable screen info (mode, geometry, pixel layout, timings)
/// Matches struct fb_var_screeninfo
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FbVarScreeninfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    /// Height of picture in mm
    pub height: u32,
    /// Width of picture in mm
    pub width: u32,
    pub accel_flags: u32,
    /// Pixel clock in picoseconds
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// Fixed screen info (memory layout of the device)
/// Matches struct fb_fix_screeninfo
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FbFixScreeninfo {
    /// Identification string, NUL padded
    pub id: [u8; 16],
    /// Physical start of framebuffer memory
    pub smem_start: libc::c_ulong,
    /// Length of framebuffer memory
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    /// Length of a line in bytes
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

impl FbFixScreeninfo {
    /// The identification string up to the first NUL
    pub fn id_str(&self) -> &str {
        let end = self.id.iter().position(|&b| b == 0).unwrap_or(self.id.len());
        core::str::from_utf8(&self.id[..end]).unwrap_or("?")
    }

    /// Set the identification string, truncating to 15 bytes
    pub fn set_id(&mut self, id: &str) {
        self.id = [0; 16];
        let len = id.len().min(self.id.len() - 1);
        self.id[..len].copy_from_slice(&id.as_bytes()[..len]);
    }
}

impl fmt::Display for FbVarScreeninfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fb variable screen info:")?;
        writeln!(f, "  bits_per_pixel = {}", self.bits_per_pixel)?;
        for (name, field) in [
            ("red", &self.red),
            ("green", &self.green),
            ("blue", &self.blue),
            ("transp", &self.transp),
        ] {
            writeln!(
                f,
                "  {:<6} .offset = {:3}  .length = {:3}",
                name, field.offset, field.length
            )?;
        }
        writeln!(f, "  pixclock = {:6}", self.pixclock)?;
        writeln!(f, "  xres={:4} yres={:4}", self.xres, self.yres)?;
        writeln!(
            f,
            "  xres_virtual={:4} yres_virtual={:4}",
            self.xres_virtual, self.yres_virtual
        )?;
        writeln!(f, "  xoffset={:4} yoffset={:4}", self.xoffset, self.yoffset)?;
        writeln!(f, "  nonstd={:3} activate={:3}", self.nonstd, self.activate)?;
        writeln!(f, "  height={:4} mm width={:4} mm", self.height, self.width)?;
        writeln!(
            f,
            "  left_margin={:4} right_margin={:4}",
            self.left_margin, self.right_margin
        )?;
        writeln!(
            f,
            "  upper_margin={:4} lower_margin={:4}",
            self.upper_margin, self.lower_margin
        )?;
        writeln!(
            f,
            "  hsync_len={:4} vsync_len={:4}",
            self.hsync_len, self.vsync_len
        )?;
        write!(f, "  vmode={:3} rotate={:3}", self.vmode, self.rotate)
    }
}

impl fmt::Display for FbFixScreeninfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fb fixed screen info:")?;
        writeln!(f, "  id={}", self.id_str())?;
        writeln!(f, "  smem_start=0x{:x}", self.smem_start)?;
        writeln!(f, "  smem_len={:9}", self.smem_len)?;
        writeln!(
            f,
            "  type={:3} type_aux={:3} visual={:3}",
            self.type_, self.type_aux, self.visual
        )?;
        writeln!(
            f,
            "  xpanstep={:3} ypanstep={:3} ywrapstep={:3}",
            self.xpanstep, self.ypanstep, self.ywrapstep
        )?;
        writeln!(f, "  line_length={:5}", self.line_length)?;
        writeln!(f, "  mmio_start=0x{:x}", self.mmio_start)?;
        writeln!(f, "  mmio_len={:9}", self.mmio_len)?;
        write!(f, "  accel={:6}", self.accel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_sizes() {
        // Sizes from linux/fb.h
        assert_eq!(core::mem::size_of::<FbVarScreeninfo>(), 160);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(core::mem::size_of::<FbFixScreeninfo>(), 80);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(core::mem::size_of::<FbFixScreeninfo>(), 68);
    }

    #[test]
    fn test_id_roundtrip() {
        let mut fix = FbFixScreeninfo::default();
        fix.set_id("mxc_epdc_fb");
        assert_eq!(fix.id_str(), "mxc_epdc_fb");

        fix.set_id("a-very-long-identifier");
        assert_eq!(fix.id_str().len(), 15);
    }

    #[test]
    fn test_dump_mentions_geometry() {
        let var = FbVarScreeninfo {
            xres: 800,
            yres: 480,
            ..Default::default()
        };
        let text = var.to_string();
        assert!(text.contains("xres= 800 yres= 480"));
    }
}

//! In-memory framebuffer emulator
//!
//! Behaves like a fbdev node without touching hardware: screen info is kept
//! in memory, mode changes and blank requests are recorded, and "device
//! memory" is an ordinary heap buffer. Useful for testing and for running
//! the display path on a development host.

use crate::device::{BlankMode, FbDevice};
use crate::error::{FbError, Result};
use crate::screeninfo::{FbFixScreeninfo, FbVarScreeninfo};
use log::trace;

/// Byte pattern that freshly mapped emulator memory is filled with
pub const MEMORY_POISON: u8 = 0xA5;

/// Geometry of an emulated framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFbConfig {
    /// Visible width in pixels
    pub xres: u32,
    /// Visible height in pixels
    pub yres: u32,
    /// Bytes per line (stride)
    pub line_length: u32,
    /// Size of device memory in bytes
    pub smem_len: u32,
    /// Depth reported before any mode change
    pub bits_per_pixel: u32,
}

impl MemoryFbConfig {
    /// Geometry with room for two frames at the given depth
    pub fn double_buffered(xres: u32, yres: u32, bits_per_pixel: u32) -> Self {
        let line_length = xres * bits_per_pixel / 8;
        Self {
            xres,
            yres,
            line_length,
            smem_len: line_length * yres * 2,
            bits_per_pixel,
        }
    }

    /// Geometry with room for a single frame at the given depth
    pub fn single_buffered(xres: u32, yres: u32, bits_per_pixel: u32) -> Self {
        let line_length = xres * bits_per_pixel / 8;
        Self {
            xres,
            yres,
            line_length,
            smem_len: line_length * yres,
            bits_per_pixel,
        }
    }

    /// Override the stride; bytes past the pixel data are kept as padding
    /// across mode changes
    pub fn with_line_length(mut self, line_length: u32) -> Self {
        self.line_length = line_length;
        self
    }
}

impl Default for MemoryFbConfig {
    fn default() -> Self {
        Self::double_buffered(800, 480, 32)
    }
}

/// Emulated framebuffer device
#[derive(Debug, Clone)]
pub struct MemoryFb {
    fix: FbFixScreeninfo,
    var: FbVarScreeninfo,
    line_padding: u32,
    mode_sets: Vec<FbVarScreeninfo>,
    blank_requests: Vec<BlankMode>,
    fail_mode_set: bool,
    fail_blank: bool,
}

impl MemoryFb {
    /// Create an emulator with the given geometry
    pub fn new(config: MemoryFbConfig) -> Self {
        let mut fix = FbFixScreeninfo {
            smem_len: config.smem_len,
            line_length: config.line_length,
            ypanstep: 1,
            ..Default::default()
        };
        fix.set_id("memfb");

        let var = FbVarScreeninfo {
            xres: config.xres,
            yres: config.yres,
            xres_virtual: config.xres,
            yres_virtual: config.yres,
            bits_per_pixel: config.bits_per_pixel,
            ..Default::default()
        };

        let row_pixels = config.xres * config.bits_per_pixel / 8;

        Self {
            fix,
            var,
            line_padding: config.line_length.saturating_sub(row_pixels),
            mode_sets: Vec::new(),
            blank_requests: Vec::new(),
            fail_mode_set: false,
            fail_blank: false,
        }
    }

    /// Make every mode change fail with `EINVAL`
    pub fn with_failing_mode_set(mut self) -> Self {
        self.fail_mode_set = true;
        self
    }

    /// Make every blank request fail with `EINVAL`
    pub fn with_failing_blank(mut self) -> Self {
        self.fail_blank = true;
        self
    }

    /// All accepted mode changes, oldest first
    pub fn mode_sets(&self) -> &[FbVarScreeninfo] {
        &self.mode_sets
    }

    /// All accepted blank requests, oldest first
    pub fn blank_requests(&self) -> &[BlankMode] {
        &self.blank_requests
    }

    /// The current mode
    pub fn current_mode(&self) -> &FbVarScreeninfo {
        &self.var
    }
}

impl Default for MemoryFb {
    fn default() -> Self {
        Self::new(MemoryFbConfig::default())
    }
}

impl FbDevice for MemoryFb {
    type Memory = Vec<u8>;

    fn fix_screeninfo(&mut self) -> Result<FbFixScreeninfo> {
        Ok(self.fix)
    }

    fn var_screeninfo(&mut self) -> Result<FbVarScreeninfo> {
        Ok(self.var)
    }

    fn put_var_screeninfo(&mut self, var: &FbVarScreeninfo) -> Result<()> {
        if self.fail_mode_set {
            return Err(FbError::Ioctl {
                request: "FBIOPUT_VSCREENINFO",
                source: nix::errno::Errno::EINVAL,
            });
        }
        trace!("memfb: mode set yoffset={}", var.yoffset);
        // Like the kernel, derive the stride from the new mode
        self.fix.line_length = var.xres_virtual * var.bits_per_pixel / 8 + self.line_padding;
        self.var = *var;
        self.mode_sets.push(*var);
        Ok(())
    }

    fn blank(&mut self, mode: BlankMode) -> Result<()> {
        if self.fail_blank {
            return Err(FbError::Ioctl {
                request: "FBIOBLANK",
                source: nix::errno::Errno::EINVAL,
            });
        }
        self.blank_requests.push(mode);
        Ok(())
    }

    fn map(&mut self, len: usize) -> Result<Vec<u8>> {
        if len == 0 || len > self.fix.smem_len as usize {
            return Err(FbError::Map {
                len,
                source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
            });
        }
        Ok(vec![MEMORY_POISON; len])
    }

    fn name(&self) -> String {
        format!("{} (in memory)", self.fix.id_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_helpers() {
        let c = MemoryFbConfig::double_buffered(100, 50, 16);
        assert_eq!(c.line_length, 200);
        assert_eq!(c.smem_len, 200 * 50 * 2);

        let c = MemoryFbConfig::single_buffered(100, 50, 32).with_line_length(512);
        assert_eq!(c.line_length, 512);
        assert_eq!(c.smem_len, 400 * 50);
    }

    #[test]
    fn test_records_mode_sets() {
        let mut fb = MemoryFb::default();
        let mut var = fb.var_screeninfo().unwrap();
        var.yoffset = 480;
        fb.put_var_screeninfo(&var).unwrap();

        assert_eq!(fb.mode_sets().len(), 1);
        assert_eq!(fb.var_screeninfo().unwrap().yoffset, 480);
    }

    #[test]
    fn test_mode_set_updates_stride() {
        let mut fb = MemoryFb::new(MemoryFbConfig::double_buffered(16, 8, 16).with_line_length(40));
        assert_eq!(fb.fix_screeninfo().unwrap().line_length, 40);

        let mut var = fb.var_screeninfo().unwrap();
        var.bits_per_pixel = 32;
        fb.put_var_screeninfo(&var).unwrap();
        // 16 pixels at 4 bytes plus the 8 bytes of padding
        assert_eq!(fb.fix_screeninfo().unwrap().line_length, 72);
    }

    #[test]
    fn test_failing_mode_set_keeps_mode() {
        let mut fb = MemoryFb::default().with_failing_mode_set();
        let mut var = fb.var_screeninfo().unwrap();
        var.bits_per_pixel = 8;

        assert!(fb.put_var_screeninfo(&var).is_err());
        assert_eq!(fb.current_mode().bits_per_pixel, 32);
        assert!(fb.mode_sets().is_empty());
    }

    #[test]
    fn test_map_bounds() {
        let mut fb = MemoryFb::default();
        let smem = fb.fix_screeninfo().unwrap().smem_len as usize;
        assert_eq!(fb.map(smem).unwrap().len(), smem);
        assert!(fb.map(smem + 1).is_err());
        assert!(fb.map(0).is_err());
    }
}

//! Framebuffer display backend
//!
//! The drawing layer calls [`FbdevBackend::init`] once, draws into the
//! surface returned by [`FbdevBackend::draw_surface`], calls
//! [`FbdevBackend::flip`] per frame, and finally [`FbdevBackend::exit`].
//!
//! # Buffering
//!
//! If device memory holds two full frames, the backend page-flips: the two
//! halves of the mapping are separate surfaces and the display is panned
//! between them, so drawing always happens in the half that is not shown.
//!
//! Otherwise drawing happens in a shadow buffer in ordinary memory and a
//! flip copies it to the single device frame.

use crate::device::{BlankMode, FbDevice};
use crate::error::{FbError, Result};
use crate::format::PixelFormat;
use crate::screeninfo::{FbFixScreeninfo, FbVarScreeninfo};
use log::{debug, error, info};

/// Dimensions shared by every surface of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row, including padding
    pub row_bytes: u32,
    /// Bytes per pixel
    pub pixel_bytes: u32,
}

impl SurfaceInfo {
    /// Size of one frame in bytes
    pub fn frame_len(&self) -> usize {
        self.height as usize * self.row_bytes as usize
    }
}

/// A drawable view of one frame
pub struct Surface<'a> {
    info: SurfaceInfo,
    data: &'a mut [u8],
}

impl<'a> Surface<'a> {
    /// Surface geometry
    pub fn info(&self) -> SurfaceInfo {
        self.info
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Raw frame bytes
    pub fn data(&self) -> &[u8] {
        &*self.data
    }

    /// Mutable raw frame bytes
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// One row of pixels, without the stride padding
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.info.height {
            return None;
        }
        let start = y as usize * self.info.row_bytes as usize;
        let len = self.info.width as usize * self.info.pixel_bytes as usize;
        self.data.get_mut(start..start + len)
    }

    /// Write one encoded pixel; out of range coordinates are ignored
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: &[u8]) {
        if x >= self.info.width || pixel.len() != self.info.pixel_bytes as usize {
            return;
        }
        let bpp = self.info.pixel_bytes as usize;
        if let Some(row) = self.row_mut(y) {
            let start = x as usize * bpp;
            row[start..start + bpp].copy_from_slice(pixel);
        }
    }

    /// Fill every visible pixel with one encoded pixel value
    pub fn fill(&mut self, pixel: &[u8]) {
        if pixel.len() != self.info.pixel_bytes as usize {
            return;
        }
        for y in 0..self.info.height {
            if let Some(row) = self.row_mut(y) {
                for chunk in row.chunks_exact_mut(pixel.len()) {
                    chunk.copy_from_slice(pixel);
                }
            }
        }
    }
}

/// Which buffer the drawing layer currently draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawBuffer {
    /// Half `n` of the device mapping
    Device(usize),
    /// The shadow buffer in ordinary memory
    Shadow,
}

enum Buffering {
    Double { displayed: usize, draw: usize },
    Single { shadow: Vec<u8> },
}

/// Framebuffer backend bound to one device
pub struct FbdevBackend<D: FbDevice> {
    device: D,
    memory: D::Memory,
    fix: FbFixScreeninfo,
    var: FbVarScreeninfo,
    format: PixelFormat,
    info: SurfaceInfo,
    buffering: Buffering,
    blanked: bool,
}

impl<D: FbDevice> FbdevBackend<D> {
    /// Configure `device` for `format`, map and clear its memory, and pick
    /// the buffering mode
    ///
    /// Fixed screen info is read again after the mode change, since the
    /// driver recomputes the stride for the new depth.
    ///
    /// # Errors
    /// Fails if screen info cannot be queried, a frame does not fit in
    /// device memory, or the memory cannot be mapped. A rejected mode change
    /// is only logged.
    pub fn init(mut device: D, format: PixelFormat) -> Result<Self> {
        let mut var = device.var_screeninfo()?;

        debug!("fbdev: requesting {} on {}", format, device.name());
        setup_variable_screeninfo(&mut device, &mut var, format);
        let fix = device.fix_screeninfo()?;
        debug!("{}", fix);

        let info = SurfaceInfo {
            width: var.xres,
            height: var.yres,
            row_bytes: fix.line_length,
            pixel_bytes: var.bits_per_pixel / 8,
        };
        let smem_len = fix.smem_len as usize;
        let frame_len = info.frame_len();
        if frame_len == 0 || frame_len > smem_len {
            return Err(FbError::Geometry {
                width: info.width,
                height: info.height,
                row_bytes: info.row_bytes,
                bits_per_pixel: var.bits_per_pixel,
                smem_len: fix.smem_len,
            });
        }

        let mut memory = device.map(smem_len)?;
        memory.fill(0);

        let buffering = if frame_len * 2 <= smem_len {
            info!("fbdev: Using double buffering");
            Buffering::Double {
                displayed: 0,
                draw: 1,
            }
        } else {
            info!("fbdev: Not using double buffering, flipping instead");
            Buffering::Single {
                shadow: vec![0; frame_len],
            }
        };

        let mut backend = Self {
            device,
            memory,
            fix,
            var,
            format,
            info,
            buffering,
            blanked: false,
        };

        backend.set_displayed_buffer(0);

        info!(
            "framebuffer: {} ({} x {})",
            backend.device.name(),
            info.width,
            info.height
        );

        backend.blank(true);
        backend.blank(false);

        Ok(backend)
    }

    /// The surface to draw the next frame into
    pub fn draw_surface(&mut self) -> Surface<'_> {
        let frame_len = self.info.frame_len();
        let data: &mut [u8] = match &mut self.buffering {
            Buffering::Double { draw, .. } => {
                let start = *draw * frame_len;
                &mut self.memory[start..start + frame_len]
            }
            Buffering::Single { shadow } => shadow.as_mut_slice(),
        };
        Surface {
            info: self.info,
            data,
        }
    }

    /// Present the drawn frame and return the surface for the next one
    ///
    /// The mode is reasserted after every flip.
    // TODO: check on P19/P14T2 hardware whether the mode set after a flip is
    // needed at all; it costs one FBIOPUT_VSCREENINFO per frame.
    pub fn flip(&mut self) -> Surface<'_> {
        match &mut self.buffering {
            Buffering::Double { displayed, draw } => {
                *draw = *displayed;
                let next = 1 - *displayed;
                self.set_displayed_buffer(next);
            }
            Buffering::Single { shadow } => {
                let frame_len = shadow.len();
                self.memory[..frame_len].copy_from_slice(shadow);
            }
        }

        setup_variable_screeninfo(&mut self.device, &mut self.var, self.format);
        self.draw_surface()
    }

    /// Power the display down (`true`) or up (`false`)
    ///
    /// Failures are logged; the recorded state only changes on success.
    pub fn blank(&mut self, blank: bool) {
        let mode = if blank {
            BlankMode::Powerdown
        } else {
            BlankMode::Unblank
        };
        match self.device.blank(mode) {
            Ok(()) => self.blanked = blank,
            Err(e) => error!("ioctl(): blank: {}", e),
        }
    }

    /// Release the device, its mapping and any shadow buffer
    pub fn exit(self) {
        info!("fbdev: closing {}", self.device.name());
    }

    /// Whether page flipping between two device buffers is in use
    pub fn is_double_buffered(&self) -> bool {
        matches!(self.buffering, Buffering::Double { .. })
    }

    /// Index of the device buffer on screen (always 0 when single buffered)
    pub fn displayed_buffer(&self) -> usize {
        match self.buffering {
            Buffering::Double { displayed, .. } => displayed,
            Buffering::Single { .. } => 0,
        }
    }

    /// Buffer the drawing layer currently draws into
    pub fn draw_buffer(&self) -> DrawBuffer {
        match self.buffering {
            Buffering::Double { draw, .. } => DrawBuffer::Device(draw),
            Buffering::Single { .. } => DrawBuffer::Shadow,
        }
    }

    /// Whether the display was last successfully blanked
    pub fn is_blanked(&self) -> bool {
        self.blanked
    }

    /// Geometry of every surface
    pub fn surface_info(&self) -> SurfaceInfo {
        self.info
    }

    /// Pixel format requested at init
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Last mode sent to the device
    pub fn var_screeninfo(&self) -> &FbVarScreeninfo {
        &self.var
    }

    /// Fixed screen info queried at init
    pub fn fix_screeninfo(&self) -> &FbFixScreeninfo {
        &self.fix
    }

    /// The whole mapped device memory
    pub fn device_memory(&self) -> &[u8] {
        &self.memory
    }

    /// The underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    fn set_displayed_buffer(&mut self, n: usize) {
        let Buffering::Double { displayed, .. } = &mut self.buffering else {
            return;
        };
        if n > 1 {
            return;
        }

        self.var.yres_virtual = self.info.height * 2;
        self.var.yoffset = n as u32 * self.info.height;
        self.var.bits_per_pixel = self.info.pixel_bytes * 8;
        if let Err(e) = self.device.put_var_screeninfo(&self.var) {
            error!("active fb swap failed: {}", e);
        }
        *displayed = n;
    }
}

/// Apply `format` to `var` and send it to the device; failures are logged
fn setup_variable_screeninfo<D: FbDevice>(
    device: &mut D,
    var: &mut FbVarScreeninfo,
    format: PixelFormat,
) {
    format.apply(var);
    match device.put_var_screeninfo(var) {
        Ok(()) => debug!("{}", var),
        Err(e) => error!("setting variable screen info failed: {}", e),
    }
}

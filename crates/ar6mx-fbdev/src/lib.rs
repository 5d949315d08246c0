//! ar6mx-fbdev - Linux fbdev display backend for the AR6MX recovery UI
//!
//! Brings up `/dev/graphics/fb0` in a chosen [`PixelFormat`], maps device
//! memory and hands out drawing surfaces. When the device memory can hold
//! two frames the backend page-flips by panning `yoffset`, otherwise it
//! draws into a shadow buffer that is copied out on every flip.
//!
//! # Example
//!
//! ```no_run
//! use ar6mx_fbdev::{open_fbdev, FbdevConfig};
//!
//! let mut backend = open_fbdev(&FbdevConfig::default())?;
//! let black = backend.pixel_format().encode(0, 0, 0);
//! backend.draw_surface().fill(&black);
//! backend.flip();
//! backend.exit();
//! # Ok::<(), ar6mx_fbdev::FbError>(())
//! ```
//!
//! The [`memory`] module provides an in-memory device for running the same
//! code without a display.

pub mod backend;
pub mod device;
pub mod error;
pub mod format;
pub mod memory;
pub mod screeninfo;

use serde::Deserialize;
use std::path::PathBuf;

// Re-exports
pub use backend::{DrawBuffer, FbdevBackend, Surface, SurfaceInfo};
pub use device::{BlankMode, FbDevice, FbMapping, LinuxFb, DEFAULT_FB_DEVICE};
pub use error::{FbError, Result};
pub use format::{PixelFormat, LVDS_PIXCLOCK};
pub use memory::{MemoryFb, MemoryFbConfig};
pub use screeninfo::{FbBitfield, FbFixScreeninfo, FbVarScreeninfo};

/// Display section of a board profile
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FbdevConfig {
    /// Framebuffer device node
    pub device: PathBuf,
    /// Pixel format requested at init
    pub pixel_format: PixelFormat,
}

impl Default for FbdevConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_FB_DEVICE),
            pixel_format: PixelFormat::default(),
        }
    }
}

/// Open the configured framebuffer device and initialize the backend
pub fn open_fbdev(config: &FbdevConfig) -> Result<FbdevBackend<LinuxFb>> {
    let device = LinuxFb::open(&config.device)?;
    FbdevBackend::init(device, config.pixel_format)
}

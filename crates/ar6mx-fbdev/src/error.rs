//! Error types for framebuffer operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Framebuffer backend errors
#[derive(Debug, Error)]
pub enum FbError {
    /// Failed to open the framebuffer device
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A framebuffer ioctl failed
    #[error("{request} failed: {source}")]
    Ioctl {
        request: &'static str,
        #[source]
        source: nix::errno::Errno,
    },

    /// Failed to map framebuffer memory
    #[error("failed to mmap {len} bytes of framebuffer memory: {source}")]
    Map {
        len: usize,
        #[source]
        source: io::Error,
    },

    /// Reported mode does not fit in device memory
    #[error(
        "framebuffer geometry {width}x{height} ({row_bytes} bytes/row, {bits_per_pixel} bpp) \
         does not fit in {smem_len} bytes"
    )]
    Geometry {
        width: u32,
        height: u32,
        row_bytes: u32,
        bits_per_pixel: u32,
        smem_len: u32,
    },
}

/// Result type for framebuffer operations
pub type Result<T> = std::result::Result<T, FbError>;

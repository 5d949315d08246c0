//! Framebuffer device access
//!
//! [`FbDevice`] is the seam between the backend and the kernel. [`LinuxFb`]
//! drives a real `/dev/graphics/fbN` node through ioctls and `mmap`.

use crate::error::{FbError, Result};
use crate::screeninfo::{FbFixScreeninfo, FbVarScreeninfo};
use log::debug;
use std::fs::{File, OpenOptions};
use std::ops::{Deref, DerefMut};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Default framebuffer node on Android recovery images
pub const DEFAULT_FB_DEVICE: &str = "/dev/graphics/fb0";

/// Display power state for `FBIOBLANK`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum BlankMode {
    /// Display on (`FB_BLANK_UNBLANK`)
    Unblank = 0,
    /// Display off (`FB_BLANK_POWERDOWN`)
    Powerdown = 4,
}

/// Operations the backend needs from a framebuffer device
pub trait FbDevice {
    /// Device memory as returned by [`FbDevice::map`]
    type Memory: DerefMut<Target = [u8]>;

    /// Query fixed screen info
    fn fix_screeninfo(&mut self) -> Result<FbFixScreeninfo>;

    /// Query variable screen info
    fn var_screeninfo(&mut self) -> Result<FbVarScreeninfo>;

    /// Request a mode change
    fn put_var_screeninfo(&mut self, var: &FbVarScreeninfo) -> Result<()>;

    /// Power the display on or off
    fn blank(&mut self, mode: BlankMode) -> Result<()>;

    /// Map `len` bytes of device memory
    fn map(&mut self, len: usize) -> Result<Self::Memory>;

    /// Human readable name for log messages
    fn name(&self) -> String;
}

/// Linux fbdev ioctls
mod ioctl {
    use crate::screeninfo::{
        FbFixScreeninfo, FbVarScreeninfo, FBIOBLANK, FBIOGET_FSCREENINFO, FBIOGET_VSCREENINFO,
        FBIOPUT_VSCREENINFO,
    };

    // fbdev request numbers predate the _IOC encoding
    nix::ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, FbVarScreeninfo);
    nix::ioctl_write_ptr_bad!(fbioput_vscreeninfo, FBIOPUT_VSCREENINFO, FbVarScreeninfo);
    nix::ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, FbFixScreeninfo);
    nix::ioctl_write_int_bad!(fbioblank, FBIOBLANK);
}

/// A Linux framebuffer device node
pub struct LinuxFb {
    file: File,
    path: PathBuf,
}

impl LinuxFb {
    /// Open a framebuffer device for reading and writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("fbdev: Opening device {}", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| FbError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl FbDevice for LinuxFb {
    type Memory = FbMapping;

    fn fix_screeninfo(&mut self) -> Result<FbFixScreeninfo> {
        let mut fix = FbFixScreeninfo::default();
        // SAFETY: valid fd and a properly sized, writable fb_fix_screeninfo
        unsafe { ioctl::fbioget_fscreeninfo(self.file.as_raw_fd(), &mut fix) }.map_err(|e| {
            FbError::Ioctl {
                request: "FBIOGET_FSCREENINFO",
                source: e,
            }
        })?;
        Ok(fix)
    }

    fn var_screeninfo(&mut self) -> Result<FbVarScreeninfo> {
        let mut var = FbVarScreeninfo::default();
        // SAFETY: valid fd and a properly sized, writable fb_var_screeninfo
        unsafe { ioctl::fbioget_vscreeninfo(self.file.as_raw_fd(), &mut var) }.map_err(|e| {
            FbError::Ioctl {
                request: "FBIOGET_VSCREENINFO",
                source: e,
            }
        })?;
        Ok(var)
    }

    fn put_var_screeninfo(&mut self, var: &FbVarScreeninfo) -> Result<()> {
        // SAFETY: valid fd and an initialized fb_var_screeninfo
        unsafe { ioctl::fbioput_vscreeninfo(self.file.as_raw_fd(), var) }.map_err(|e| {
            FbError::Ioctl {
                request: "FBIOPUT_VSCREENINFO",
                source: e,
            }
        })?;
        Ok(())
    }

    fn blank(&mut self, mode: BlankMode) -> Result<()> {
        // SAFETY: FBIOBLANK takes its argument by value
        unsafe { ioctl::fbioblank(self.file.as_raw_fd(), mode as libc::c_int) }.map_err(|e| {
            FbError::Ioctl {
                request: "FBIOBLANK",
                source: e,
            }
        })?;
        Ok(())
    }

    fn map(&mut self, len: usize) -> Result<FbMapping> {
        FbMapping::new(&self.file, len)
    }

    fn name(&self) -> String {
        format!("{} (fd {})", self.path.display(), self.file.as_raw_fd())
    }
}

/// Shared mapping of framebuffer memory, unmapped on drop
pub struct FbMapping {
    ptr: *mut u8,
    len: usize,
}

impl FbMapping {
    fn new(file: &File, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(FbError::Map {
                len,
                source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
            });
        }

        // SAFETY: mapping a device fd we own; the kernel validates the range
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(FbError::Map {
                len,
                source: std::io::Error::last_os_error(),
            });
        }

        debug!("fbdev: Mapped {} bytes at {:p}", len, ptr);
        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }
}

impl Deref for FbMapping {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: ptr/len describe a live mapping owned by self
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl DerefMut for FbMapping {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for FbMapping {
    fn drop(&mut self) {
        // SAFETY: unmapping exactly the region returned by mmap
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.len);
        }
    }
}

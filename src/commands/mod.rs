//! CLI command implementations
//!
//! ## Bootloader commands
//!
//! `flash`, `copy` and `call` drive the `ar6mx-updater` crate and report copy
//! progress through indicatif.
//!
//! ## Display commands
//!
//! `fb-test` brings up the fbdev backend, either on the board's framebuffer
//! or on an in-memory device.

pub mod fb;
pub mod flash;
mod sysfs;

pub use sysfs::run_sysfs_write;

//! ar6mx-updater - eMMC boot partition flashing for the AR6MX recovery image
//!
//! The AR6MX bootloader lives in the eMMC hardware boot partition
//! (`/dev/block/mmcblk3boot0`). The kernel keeps that partition read-only
//! until `force_ro` is cleared, and the card only boots from it once
//! `boot_config` selects it.
//!
//! # Example
//!
//! ```no_run
//! use ar6mx_updater::{flash_bootloader, BootPartition, CopyJob, NoProgress};
//!
//! let partition = BootPartition::default();
//! let job = CopyJob::new("/tmp/u-boot.imx", "/dev/block/mmcblk3boot0")
//!     .with_seek(1024);
//! let report = flash_bootloader(&partition, &job, &mut NoProgress)?;
//! println!("{} bytes written", report.copy.bytes_written);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Update scripts
//!
//! The same sequence is exposed to recovery update scripts as
//! `ar6mx.write_bootloader(src_path, dst_path, seek, skip)`, see
//! [`functions`].

pub mod copy;
pub mod error;
pub mod flash;
pub mod functions;
pub mod sysfs;

// Re-exports
pub use copy::{update_bootloader, CopyJob, CopyProgress, CopyStats, NoProgress, COPY_CHUNK_SIZE};
pub use error::{CopyError, FlashError, Result, SysfsError};
pub use flash::{flash_bootloader, BootPartition, FlashReport};
pub use functions::{call_function, find_function, registered_functions, UpdaterFunction};
pub use sysfs::write_sysfs;

//! Error types for updater operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from writing a sysfs attribute
#[derive(Debug, Error)]
pub enum SysfsError {
    /// The value could not be rendered as text
    #[error("Conversion problem for value {value} on node {}", .path.display())]
    Format { value: u64, path: PathBuf },

    /// The attribute could not be opened for writing
    #[error("Could not open sysfs node {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The attribute rejected the write
    #[error("Could not write sysfs node {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SysfsError {
    /// Legacy numeric code: `-1` for formatting problems, the OS errno otherwise
    pub fn code(&self) -> i32 {
        match self {
            SysfsError::Format { .. } => -1,
            SysfsError::Open { source, .. } | SysfsError::Write { source, .. } => {
                source.raw_os_error().unwrap_or(-1)
            }
        }
    }
}

/// Errors from copying a bootloader image
#[derive(Debug, Error)]
pub enum CopyError {
    /// Source image could not be opened
    #[error("Source file {} not found: {source}", .path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Destination device could not be opened
    #[error("Destination path {} not found: {source}", .path.display())]
    DestinationOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source image became unreadable in the middle of the copy
    #[error("Read of {} failed after {copied} bytes: {source}", .path.display())]
    Read {
        path: PathBuf,
        copied: u64,
        #[source]
        source: io::Error,
    },
}

impl CopyError {
    /// Legacy numeric code; distinct per failing side
    pub fn code(&self) -> i32 {
        match self {
            CopyError::SourceOpen { .. } => -1,
            CopyError::DestinationOpen { .. } => -2,
            CopyError::Read { .. } => -3,
        }
    }
}

/// Errors from the full flashing sequence
#[derive(Debug, Error)]
pub enum FlashError {
    /// Step 1 failed; the device is still in its default locked state
    #[error("Unlocking MMC boot partition failed: {0}")]
    Unlock(#[source] SysfsError),

    /// Step 2 failed after the partition was unlocked
    #[error(
        "Writing the bootloader from {} to {} with seek={seek} and skip={skip} failed, \
         your unit may now be bricked (result={})",
        .source_path.display(),
        .destination.display(),
        .source.code()
    )]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        seek: u64,
        skip: u64,
        #[source]
        source: CopyError,
    },

    /// Step 3 failed; the image is written but the partition is unlocked
    #[error("Relocking MMC boot partition failed: {0}")]
    Relock(#[source] SysfsError),

    /// Step 4 failed; the image is written but may not be selected for boot
    #[error("Enabling boot from MMC boot partition failed: {0}")]
    EnableBoot(#[source] SysfsError),

    /// Function called with the wrong number of arguments
    #[error("{name}() expects {expected} args, got {got}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Argument could not be interpreted
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: &'static str, message: String },

    /// No function registered under the given name
    #[error("Unknown updater function: {0}")]
    UnknownFunction(String),
}

impl FlashError {
    /// Whether the failure happened while the boot partition was unlocked
    /// and partially written
    pub fn may_have_bricked(&self) -> bool {
        matches!(self, FlashError::Copy { .. })
    }
}

/// Result type for updater operations
pub type Result<T> = std::result::Result<T, FlashError>;

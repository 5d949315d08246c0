//! Updater function table
//!
//! The recovery updater interpreter calls board extensions by name with
//! string arguments and expects a string back: `"t"` for success, `""` for
//! failure. This module holds the functions this crate provides and the
//! argument handling they share.

use crate::copy::{CopyJob, CopyProgress};
use crate::error::{FlashError, Result};
use crate::flash::{flash_bootloader, BootPartition};
use log::info;

/// Name under which the bootloader flasher is registered
pub const WRITE_BOOTLOADER: &str = "ar6mx.write_bootloader";

/// Truthy result string
pub const RESULT_TRUE: &str = "t";

/// Signature of an updater extension function
pub type UpdaterFn =
    fn(name: &str, args: &[&str], partition: &BootPartition, progress: &mut dyn CopyProgress) -> Result<String>;

/// A named updater function
pub struct UpdaterFunction {
    /// Name used by update scripts
    pub name: &'static str,
    /// Argument names, in order
    pub args: &'static [&'static str],
    /// Short description
    pub description: &'static str,
    /// Implementation
    pub func: UpdaterFn,
}

/// All functions provided by this crate
pub fn registered_functions() -> &'static [UpdaterFunction] {
    static FUNCTIONS: [UpdaterFunction; 1] = [UpdaterFunction {
        name: WRITE_BOOTLOADER,
        args: &["src_path", "dst_path", "seek", "skip"],
        description: "Unlock the eMMC boot partition, write a bootloader image, relock and enable boot",
        func: write_bootloader_fn,
    }];
    &FUNCTIONS
}

/// Look up a function by name
pub fn find_function(name: &str) -> Option<&'static UpdaterFunction> {
    registered_functions().iter().find(|f| f.name == name)
}

/// Look up and invoke a function by name
pub fn call_function(
    name: &str,
    args: &[&str],
    partition: &BootPartition,
    progress: &mut dyn CopyProgress,
) -> Result<String> {
    let function = find_function(name).ok_or_else(|| FlashError::UnknownFunction(name.to_string()))?;
    info!("Calling {}({})", function.name, args.join(", "));
    (function.func)(name, args, partition, progress)
}

/// `ar6mx.write_bootloader(src_path, dst_path, seek, skip)`
pub fn write_bootloader_fn(
    name: &str,
    args: &[&str],
    partition: &BootPartition,
    progress: &mut dyn CopyProgress,
) -> Result<String> {
    let [src, dst, seek, skip] = args else {
        return Err(FlashError::ArgumentCount {
            name: name.to_string(),
            expected: 4,
            got: args.len(),
        });
    };

    let seek = parse_offset("seek", seek)?;
    let skip = parse_offset("skip", skip)?;

    let job = CopyJob::new(*src, *dst).with_seek(seek).with_skip(skip);
    flash_bootloader(partition, &job, progress)?;

    Ok(RESULT_TRUE.to_string())
}

/// Parse a byte offset given as decimal or `0x` hex
pub fn parse_offset(name: &'static str, value: &str) -> Result<u64> {
    let s = value.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse::<u64>()
    };
    parsed.map_err(|e| FlashError::InvalidArgument {
        name,
        message: format!("'{}' is not a valid offset: {}", value, e),
    })
}

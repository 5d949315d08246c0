//! Sysfs attribute writer
//!
//! Kernel attributes such as `/sys/block/mmcblk3boot0/force_ro` take a
//! decimal ASCII integer. The value is written exactly, without a trailing
//! newline.

use crate::error::SysfsError;
use log::{debug, info};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Write `value` in decimal to the sysfs attribute at `path`
///
/// The node is opened write-only with `O_SYNC` and is never created. A
/// failure is not retried; the caller decides whether to abort.
///
/// # Errors
/// - [`SysfsError::Format`] if the value could not be rendered
/// - [`SysfsError::Open`] if the node is missing or not writable
/// - [`SysfsError::Write`] if the kernel rejected the value
pub fn write_sysfs(value: u64, path: impl AsRef<Path>) -> Result<(), SysfsError> {
    let path = path.as_ref();

    let mut text = String::new();
    write!(text, "{}", value).map_err(|_| SysfsError::Format {
        value,
        path: path.to_path_buf(),
    })?;

    let mut node = OpenOptions::new()
        .write(true)
        .truncate(true)
        .custom_flags(libc::O_SYNC)
        .open(path)
        .map_err(|e| SysfsError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!(
        "Writing to {} the value {} ({} bytes)",
        path.display(),
        text,
        text.len()
    );

    node.write_all(text.as_bytes())
        .map_err(|e| SysfsError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Successfully wrote sysfs node {} with value {}", path.display(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_zero_then_one() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("force_ro");
        fs::write(&node, "1").unwrap();

        write_sysfs(0, &node).unwrap();
        assert_eq!(fs::read_to_string(&node).unwrap(), "0");

        write_sysfs(1, &node).unwrap();
        assert_eq!(fs::read_to_string(&node).unwrap(), "1");
    }

    #[test]
    fn test_write_large_value() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("boot_config");
        fs::write(&node, "").unwrap();

        write_sysfs(u64::MAX, &node).unwrap();
        assert_eq!(fs::read_to_string(&node).unwrap(), "18446744073709551615");

        // Shorter value replaces the longer one entirely
        write_sysfs(8, &node).unwrap();
        assert_eq!(fs::read_to_string(&node).unwrap(), "8");
    }

    #[test]
    fn test_missing_node_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("missing");

        let err = write_sysfs(0, &node).unwrap_err();
        assert!(matches!(err, SysfsError::Open { .. }));
        assert_eq!(err.code(), libc::ENOENT);
        assert!(!node.exists());
    }
}

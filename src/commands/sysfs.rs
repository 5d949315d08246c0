//! Sysfs attribute command

use ar6mx_updater::write_sysfs;
use std::path::Path;

/// Write a single value to a sysfs attribute
pub fn run_sysfs_write(path: &Path, value: u64) -> Result<(), Box<dyn std::error::Error>> {
    write_sysfs(value, path)?;
    println!("Wrote {} to {}", value, path.display());
    Ok(())
}

//! Boot partition flashing sequence
//!
//! The eMMC boot partition is write-protected by the kernel through
//! `force_ro`. Flashing unlocks it, copies the image, relocks it, and then
//! selects the partition for boot through `boot_config`.
//!
//! Once the partition is unlocked the device is no longer in its default
//! state, and nothing is rolled back if a later step fails.

use crate::copy::{update_bootloader, CopyJob, CopyProgress, CopyStats};
use crate::error::{FlashError, Result};
use crate::sysfs::write_sysfs;
use log::{error, info, warn};
use serde::Deserialize;
use std::path::PathBuf;

/// Default write-protect node for the AR6MX boot partition
pub const DEFAULT_FORCE_RO_NODE: &str = "/sys/block/mmcblk3boot0/force_ro";

/// Default boot configuration node for the AR6MX eMMC
pub const DEFAULT_BOOT_CONFIG_NODE: &str = "/sys/block/mmcblk3/device/boot_config";

/// `force_ro` value that allows writes
pub const FORCE_RO_UNLOCK: u64 = 0;

/// `force_ro` value that blocks writes
pub const FORCE_RO_LOCK: u64 = 1;

/// `boot_config` value enabling boot from boot partition 1
pub const BOOT_CONFIG_ENABLE: u64 = 8;

/// Sysfs nodes and values controlling the boot partition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BootPartition {
    /// Write-protect toggle
    pub force_ro: PathBuf,
    /// Boot partition selector
    pub boot_config: PathBuf,
    /// Value written to `boot_config` after a successful flash
    pub boot_config_value: u64,
    /// Copy chunk size in bytes
    pub chunk_size: usize,
}

impl Default for BootPartition {
    fn default() -> Self {
        Self {
            force_ro: PathBuf::from(DEFAULT_FORCE_RO_NODE),
            boot_config: PathBuf::from(DEFAULT_BOOT_CONFIG_NODE),
            boot_config_value: BOOT_CONFIG_ENABLE,
            chunk_size: crate::copy::COPY_CHUNK_SIZE,
        }
    }
}

/// Summary of a completed flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashReport {
    /// Statistics of the image copy
    pub copy: CopyStats,
}

impl FlashReport {
    /// True if the copy reported seek failures or short writes
    pub fn has_warnings(&self) -> bool {
        !self.copy.is_clean()
    }
}

/// Flash a bootloader image: unlock, copy, relock, enable boot
///
/// Stops at the first failing step. A copy failure after the unlock is
/// reported as [`FlashError::Copy`], which may leave the unit unbootable.
pub fn flash_bootloader<P: CopyProgress + ?Sized>(
    partition: &BootPartition,
    job: &CopyJob,
    progress: &mut P,
) -> Result<FlashReport> {
    info!(
        "Unlocking boot partition via {}",
        partition.force_ro.display()
    );
    write_sysfs(FORCE_RO_UNLOCK, &partition.force_ro).map_err(FlashError::Unlock)?;

    let job = job.clone().with_chunk_size(partition.chunk_size);
    let copy = match update_bootloader(&job, progress) {
        Ok(stats) => stats,
        Err(e) => {
            error!("Bootloader copy failed with the boot partition unlocked");
            return Err(FlashError::Copy {
                source_path: job.source.clone(),
                destination: job.destination.clone(),
                seek: job.seek,
                skip: job.skip,
                source: e,
            });
        }
    };

    if !copy.is_clean() {
        warn!(
            "Copy finished with {} short write(s) and {} failed seek(s); the flashed image may be incomplete",
            copy.mismatches, copy.seek_failures
        );
    }

    info!("Relocking boot partition");
    write_sysfs(FORCE_RO_LOCK, &partition.force_ro).map_err(FlashError::Relock)?;

    info!(
        "Enabling boot via {} = {}",
        partition.boot_config.display(),
        partition.boot_config_value
    );
    write_sysfs(partition.boot_config_value, &partition.boot_config)
        .map_err(FlashError::EnableBoot)?;

    Ok(FlashReport { copy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::NoProgress;
    use crate::error::SysfsError;
    use std::fs;
    use std::path::Path;

    struct Board {
        _dir: tempfile::TempDir,
        partition: BootPartition,
        image: PathBuf,
        device: PathBuf,
    }

    fn board(root: &Path) -> BootPartition {
        BootPartition {
            force_ro: root.join("force_ro"),
            boot_config: root.join("boot_config"),
            ..Default::default()
        }
    }

    fn setup() -> Board {
        let dir = tempfile::tempdir().unwrap();
        let partition = board(dir.path());
        fs::write(&partition.force_ro, "1").unwrap();
        fs::write(&partition.boot_config, "0").unwrap();

        let image = dir.path().join("u-boot.imx");
        fs::write(&image, vec![0x5Au8; 3000]).unwrap();
        let device = dir.path().join("mmcblk3boot0");
        fs::write(&device, vec![0u8; 8192]).unwrap();

        Board {
            _dir: dir,
            partition,
            image,
            device,
        }
    }

    #[test]
    fn test_full_sequence() {
        let b = setup();
        let job = CopyJob::new(&b.image, &b.device).with_seek(1024);

        let report = flash_bootloader(&b.partition, &job, &mut NoProgress).unwrap();
        assert_eq!(report.copy.bytes_written, 3000);
        assert!(!report.has_warnings());

        assert_eq!(fs::read_to_string(&b.partition.force_ro).unwrap(), "1");
        assert_eq!(fs::read_to_string(&b.partition.boot_config).unwrap(), "8");

        let out = fs::read(&b.device).unwrap();
        assert!(out[..1024].iter().all(|&x| x == 0));
        assert!(out[1024..4024].iter().all(|&x| x == 0x5A));
    }

    #[test]
    fn test_unlock_failure_stops_before_copy() {
        let b = setup();
        fs::remove_file(&b.partition.force_ro).unwrap();
        let job = CopyJob::new(&b.image, &b.device);

        let err = flash_bootloader(&b.partition, &job, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FlashError::Unlock(SysfsError::Open { .. })));
        assert!(!err.may_have_bricked());
        assert!(fs::read(&b.device).unwrap().iter().all(|&x| x == 0));
        assert_eq!(fs::read_to_string(&b.partition.boot_config).unwrap(), "0");
    }

    #[test]
    fn test_copy_failure_leaves_partition_unlocked() {
        let b = setup();
        let job = CopyJob::new(b.image.with_extension("missing"), &b.device);

        let err = flash_bootloader(&b.partition, &job, &mut NoProgress).unwrap_err();
        assert!(err.may_have_bricked());
        assert!(err.to_string().contains("may now be bricked"));
        assert!(err.to_string().contains("result=-1"));

        // No rollback: still unlocked, boot config untouched
        assert_eq!(fs::read_to_string(&b.partition.force_ro).unwrap(), "0");
        assert_eq!(fs::read_to_string(&b.partition.boot_config).unwrap(), "0");
    }

    #[test]
    fn test_enable_boot_failure() {
        let b = setup();
        fs::remove_file(&b.partition.boot_config).unwrap();
        let job = CopyJob::new(&b.image, &b.device);

        let err = flash_bootloader(&b.partition, &job, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FlashError::EnableBoot(_)));
        assert_eq!(fs::read_to_string(&b.partition.force_ro).unwrap(), "1");
    }

    #[test]
    fn test_default_nodes() {
        let p = BootPartition::default();
        assert_eq!(p.force_ro, PathBuf::from("/sys/block/mmcblk3boot0/force_ro"));
        assert_eq!(p.boot_config_value, 8);
        assert_eq!(p.chunk_size, 1024);
    }
}

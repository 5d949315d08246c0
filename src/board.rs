//! Board profile loading
//!
//! A board profile describes where the boot partition controls and the
//! display live on a particular AR6MX variant:
//!
//! ```toml
//! [boot]
//! force_ro = "/sys/block/mmcblk3boot0/force_ro"
//! boot_config = "/sys/block/mmcblk3/device/boot_config"
//! boot_config_value = 8
//! chunk_size = 1024
//!
//! [display]
//! device = "/dev/graphics/fb0"
//! pixel_format = "rgb565"
//! ```
//!
//! Every field is optional and falls back to the AR6MX defaults.

use ar6mx_fbdev::FbdevConfig;
use ar6mx_updater::BootPartition;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from loading a board profile
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The profile file could not be read
    #[error("failed to read board profile {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The profile is not valid TOML or has invalid values
    #[error("invalid board profile: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Effective configuration for one board
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// eMMC boot partition controls
    pub boot: BootPartition,
    /// Display settings
    pub display: FbdevConfig,
}

impl BoardConfig {
    /// Parse a profile from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, BoardError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a profile from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, BoardError> {
        let content = fs::read_to_string(path).map_err(|e| BoardError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the profile at `path`, or the built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self, BoardError> {
        match path {
            Some(path) => {
                let board = Self::from_toml_file(path)?;
                log::info!("Loaded board profile from {}", path.display());
                Ok(board)
            }
            None => {
                log::debug!("Using built-in AR6MX board profile");
                Ok(Self::default())
            }
        }
    }

    /// Print the profile in a human readable form
    pub fn print(&self) {
        println!("Board profile");
        println!("=============");
        println!();
        println!("[boot]");
        println!("force_ro          = {}", self.boot.force_ro.display());
        println!("boot_config       = {}", self.boot.boot_config.display());
        println!("boot_config_value = {}", self.boot.boot_config_value);
        println!("chunk_size        = {}", self.boot.chunk_size);
        println!();
        println!("[display]");
        println!("device            = {}", self.display.device.display());
        println!("pixel_format      = {}", self.display.pixel_format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ar6mx_fbdev::{PixelFormat, DEFAULT_FB_DEVICE};
    use std::io::Write;

    #[test]
    fn test_empty_profile_uses_defaults() {
        let board = BoardConfig::from_toml_str("").unwrap();
        assert_eq!(board, BoardConfig::default());
        assert_eq!(board.boot.boot_config_value, 8);
        assert_eq!(board.display.device, PathBuf::from(DEFAULT_FB_DEVICE));
    }

    #[test]
    fn test_partial_profile() {
        let board = BoardConfig::from_toml_str(
            r#"
            [boot]
            force_ro = "/sys/block/mmcblk2boot0/force_ro"

            [display]
            pixel_format = "rgb565"
            "#,
        )
        .unwrap();

        assert_eq!(
            board.boot.force_ro,
            PathBuf::from("/sys/block/mmcblk2boot0/force_ro")
        );
        assert_eq!(board.boot.boot_config, BootPartition::default().boot_config);
        assert_eq!(board.display.pixel_format, PixelFormat::Rgb565);
    }

    #[test]
    fn test_invalid_pixel_format() {
        let result = BoardConfig::from_toml_str("[display]\npixel_format = \"yuv\"\n");
        assert!(matches!(result, Err(BoardError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[boot]\nchunk_size = 4096").unwrap();

        let board = BoardConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(board.boot.chunk_size, 4096);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = BoardConfig::from_toml_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(BoardError::Read { .. })));
    }
}

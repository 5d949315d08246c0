//! CLI argument parsing

use ar6mx_fbdev::PixelFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u64
fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "ar6mx-recovery")]
#[command(author, version, about = "AR6MX recovery bootloader and display tools", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Board profile (TOML format)
    /// Defaults to the built-in AR6MX profile
    #[arg(long, global = true)]
    pub board: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Source/destination options shared by the copy commands
#[derive(clap::Args, Debug, Clone)]
pub struct ImageArgs {
    /// Bootloader image to write
    #[arg(short, long)]
    pub input: PathBuf,

    /// Destination device or file (e.g. /dev/block/mmcblk3boot0)
    #[arg(short, long)]
    pub device: PathBuf,

    /// Byte offset in the destination (hex or decimal)
    #[arg(long, default_value = "0", value_parser = parse_hex_u64)]
    pub seek: u64,

    /// Byte offset in the image (hex or decimal)
    #[arg(long, default_value = "0", value_parser = parse_hex_u64)]
    pub skip: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Unlock the boot partition, write a bootloader, relock and enable boot
    Flash {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// Copy an image without touching the boot partition controls
    Copy {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// Write a decimal value to a sysfs attribute
    SysfsWrite {
        /// Attribute path
        path: PathBuf,

        /// Value to write (hex or decimal)
        #[arg(value_parser = parse_hex_u64)]
        value: u64,
    },

    /// Call a registered updater function by name
    Call {
        /// Function name (e.g. ar6mx.write_bootloader)
        name: String,

        /// Function arguments
        args: Vec<String>,
    },

    /// List registered updater functions
    ListFunctions,

    /// Exercise the framebuffer backend with a test pattern
    FbTest {
        /// Use an in-memory framebuffer instead of the device
        #[arg(long)]
        dummy: bool,

        /// Number of frames to flip
        #[arg(long, default_value = "2")]
        frames: u32,

        /// Pixel format (rgb565, rgbx8888, gray8), overrides the board profile
        #[arg(long)]
        format: Option<PixelFormat>,
    },

    /// Print the effective board profile
    ShowBoard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("1024").unwrap(), 1024);
        assert_eq!(parse_hex_u64("0x400").unwrap(), 1024);
        assert_eq!(parse_hex_u64("0X400").unwrap(), 1024);
        assert!(parse_hex_u64("1k").is_err());
    }

    #[test]
    fn test_parse_flash() {
        let cli = Cli::try_parse_from([
            "ar6mx-recovery",
            "flash",
            "--input",
            "u-boot.imx",
            "--device",
            "/dev/block/mmcblk3boot0",
            "--seek",
            "0x400",
        ])
        .unwrap();
        match cli.command {
            Commands::Flash { image } => {
                assert_eq!(image.seek, 1024);
                assert_eq!(image.skip, 0);
            }
            _ => panic!("expected flash"),
        }
    }

    #[test]
    fn test_parse_fb_test_format() {
        let cli =
            Cli::try_parse_from(["ar6mx-recovery", "-v", "fb-test", "--dummy", "--format", "rgb565"])
                .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::FbTest { dummy, frames, format } => {
                assert!(dummy);
                assert_eq!(frames, 2);
                assert_eq!(format, Some(PixelFormat::Rgb565));
            }
            _ => panic!("expected fb-test"),
        }
    }
}

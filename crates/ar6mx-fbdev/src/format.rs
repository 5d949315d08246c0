//! Pixel formats supported by the AR6MX panels

use crate::screeninfo::{FbBitfield, FbVarScreeninfo, FB_ACTIVATE_NOW};
use core::fmt;
use core::str::FromStr;
use serde::Deserialize;

/// Pixel clock of the P19 LVDS panel, in picoseconds
pub const LVDS_PIXCLOCK: u32 = 12843;

/// Framebuffer pixel layout requested at init
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 16-bit RGB 5-6-5 (P19 LVDS panel)
    Rgb565,
    /// 32-bit RGBX 8-8-8-8 (P14T2 HDMI)
    #[default]
    Rgbx8888,
    /// 8-bit grayscale
    Gray8,
}

impl PixelFormat {
    /// All formats, in a stable order
    pub const ALL: [PixelFormat; 3] = [PixelFormat::Rgb565, PixelFormat::Rgbx8888, PixelFormat::Gray8];

    /// Bits per pixel
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgb565 => 16,
            PixelFormat::Rgbx8888 => 32,
            PixelFormat::Gray8 => 8,
        }
    }

    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> u32 {
        self.bits_per_pixel() / 8
    }

    /// Short name as used in board profiles
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb565 => "rgb565",
            PixelFormat::Rgbx8888 => "rgbx8888",
            PixelFormat::Gray8 => "gray8",
        }
    }

    /// Write the pixel layout into `var` and request a virtual height of
    /// two frames for page flipping
    pub fn apply(self, var: &mut FbVarScreeninfo) {
        match self {
            PixelFormat::Rgb565 => {
                var.red = FbBitfield::new(11, 5);
                var.green = FbBitfield::new(5, 6);
                var.blue = FbBitfield::new(0, 5);
                var.transp = FbBitfield::new(0, 0);
                var.activate = 0;
                var.pixclock = LVDS_PIXCLOCK;
            }
            PixelFormat::Rgbx8888 => {
                var.red = FbBitfield::new(0, 8);
                var.green = FbBitfield::new(8, 8);
                var.blue = FbBitfield::new(16, 8);
                var.transp = FbBitfield::new(24, 8);
                var.activate = FB_ACTIVATE_NOW;
            }
            PixelFormat::Gray8 => {
                var.grayscale = 1;
                var.activate = FB_ACTIVATE_NOW;
            }
        }
        var.bits_per_pixel = self.bits_per_pixel();
        var.xres_virtual = var.xres;
        var.yres_virtual = var.yres * 2;
    }

    /// Encode an opaque RGB color in this format, little-endian
    pub fn encode(self, r: u8, g: u8, b: u8) -> Vec<u8> {
        match self {
            PixelFormat::Rgb565 => {
                let v = (((r as u16) >> 3) << 11) | (((g as u16) >> 2) << 5) | ((b as u16) >> 3);
                v.to_le_bytes().to_vec()
            }
            PixelFormat::Rgbx8888 => vec![r, g, b, 0xFF],
            PixelFormat::Gray8 => {
                // ITU-R BT.601 luma
                let y = (299 * (r as u32) + 587 * (g as u32) + 114 * (b as u32)) / 1000;
                vec![y as u8]
            }
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb565" | "565" | "bgra" => Ok(PixelFormat::Rgb565),
            "rgbx8888" | "rgbx" | "8888" => Ok(PixelFormat::Rgbx8888),
            "gray8" | "grayscale" | "gray" => Ok(PixelFormat::Gray8),
            _ => Err(format!(
                "unknown pixel format '{}' (expected rgb565, rgbx8888 or gray8)",
                s
            )),
        }
    }
}

//! Framebuffer test command

use ar6mx_fbdev::{
    open_fbdev, FbDevice, FbdevBackend, FbdevConfig, MemoryFb, MemoryFbConfig, PixelFormat,
    Surface,
};
use std::thread;
use std::time::Duration;

/// Color bars drawn by the test pattern
const BARS: [(u8, u8, u8); 8] = [
    (0xFF, 0xFF, 0xFF),
    (0xFF, 0xFF, 0x00),
    (0x00, 0xFF, 0xFF),
    (0x00, 0xFF, 0x00),
    (0xFF, 0x00, 0xFF),
    (0xFF, 0x00, 0x00),
    (0x00, 0x00, 0xFF),
    (0x00, 0x00, 0x00),
];

/// Delay between flipped frames on a real display
const FRAME_DELAY: Duration = Duration::from_millis(500);

/// Draw vertical color bars, rotated by `frame` positions
fn draw_bars(surface: &mut Surface<'_>, format: PixelFormat, frame: u32) {
    let pixels: Vec<Vec<u8>> = BARS
        .iter()
        .map(|&(r, g, b)| format.encode(r, g, b))
        .collect();
    let width = surface.width();
    let bar_width = (width / BARS.len() as u32).max(1);

    for y in 0..surface.height() {
        for x in 0..width {
            let bar = ((x / bar_width + frame) as usize) % BARS.len();
            surface.put_pixel(x, y, &pixels[bar]);
        }
    }
}

/// Draw `frames` frames of the test pattern, then cycle the display power
pub fn run_pattern<D: FbDevice>(
    mut backend: FbdevBackend<D>,
    frames: u32,
    delay: Duration,
) -> FbdevBackend<D> {
    let format = backend.pixel_format();
    let info = backend.surface_info();
    println!(
        "Display: {} x {} ({}, {} bytes/row, {})",
        info.width,
        info.height,
        format,
        info.row_bytes,
        if backend.is_double_buffered() {
            "double buffered"
        } else {
            "single buffered"
        }
    );

    for frame in 0..frames {
        draw_bars(&mut backend.draw_surface(), format, frame);
        backend.flip();
        log::debug!("fb-test: frame {} on buffer {}", frame, backend.displayed_buffer());
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    backend.blank(true);
    backend.blank(false);
    backend
}

/// Run the test pattern on the configured framebuffer, or an in-memory one
pub fn run_fb_test(
    config: &FbdevConfig,
    dummy: bool,
    frames: u32,
    format: Option<PixelFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = format.unwrap_or(config.pixel_format);

    if dummy {
        let device = MemoryFb::new(MemoryFbConfig::default());
        let backend = FbdevBackend::init(device, format)?;
        let backend = run_pattern(backend, frames, Duration::ZERO);
        println!(
            "In-memory display: {} mode sets, {} blank requests",
            backend.device().mode_sets().len(),
            backend.device().blank_requests().len()
        );
        backend.exit();
    } else {
        let config = FbdevConfig {
            pixel_format: format,
            ..config.clone()
        };
        let backend = open_fbdev(&config)?;
        run_pattern(backend, frames, FRAME_DELAY).exit();
    }

    println!("Framebuffer test complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(format: PixelFormat) -> FbdevBackend<MemoryFb> {
        let fb = MemoryFb::new(MemoryFbConfig::double_buffered(16, 4, 32));
        FbdevBackend::init(fb, format).unwrap()
    }

    #[test]
    fn test_pattern_flips_each_frame() {
        let backend = run_pattern(backend(PixelFormat::Rgbx8888), 3, Duration::ZERO);
        // Init sets the mode and pans, each frame pans and reasserts the mode
        assert_eq!(backend.device().mode_sets().len(), 2 + 3 * 2);
        assert_eq!(backend.displayed_buffer(), 1);
        assert!(!backend.is_blanked());
    }

    #[test]
    fn test_pattern_reaches_device_memory() {
        let backend = run_pattern(backend(PixelFormat::Rgbx8888), 1, Duration::ZERO);
        let frame_len = backend.surface_info().frame_len();
        let shown = &backend.device_memory()[frame_len..2 * frame_len];
        // First bar is white
        assert_eq!(&shown[..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_bars_rotate() {
        let mut backend = backend(PixelFormat::Rgbx8888);
        let mut surface = backend.draw_surface();
        assert_eq!(surface.info().row_bytes, 64);

        draw_bars(&mut surface, PixelFormat::Rgbx8888, 1);
        // Bars are two pixels wide, frame 1 starts with the yellow bar
        assert_eq!(&surface.data()[..4], &[0xFF, 0xFF, 0x00, 0xFF]);
        assert_eq!(&surface.data()[8..12], &[0x00, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_dummy_run() {
        run_fb_test(&FbdevConfig::default(), true, 2, Some(PixelFormat::Gray8)).unwrap();
    }
}

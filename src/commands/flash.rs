//! Bootloader flashing commands

use ar6mx_updater::{
    call_function, flash_bootloader, registered_functions, update_bootloader, BootPartition,
    CopyJob, CopyProgress, CopyStats,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::cli::ImageArgs;

/// Create a progress bar with custom phase message
fn create_progress_bar_with_phase(
    total: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Create a spinner for copies of unknown length (block devices)
fn create_spinner(phase: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {bytes} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(phase.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Copy progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
    phase: &'static str,
}

impl IndicatifProgress {
    pub fn new(phase: &'static str) -> Self {
        Self { bar: None, phase }
    }
}

impl CopyProgress for IndicatifProgress {
    fn started(&mut self, total: Option<u64>) {
        let pb = match total {
            Some(total) => create_progress_bar_with_phase(total, self.phase)
                .unwrap_or_else(|_| ProgressBar::new(total)),
            None => create_spinner(self.phase),
        };
        self.bar = Some(pb);
    }

    fn progress(&mut self, written: u64) {
        if let Some(pb) = &self.bar {
            pb.set_position(written);
        }
    }

    fn mismatch(&mut self, read: usize, written: usize) {
        if let Some(pb) = &self.bar {
            pb.println(format!("short write: read={} written={}", read, written));
        }
    }

    fn finished(&mut self, stats: &CopyStats) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!("{} complete", self.phase));
        }
        print_stats(stats);
    }
}

fn print_stats(stats: &CopyStats) {
    println!(
        "Copied {} bytes ({} bytes read)",
        stats.bytes_written, stats.bytes_read
    );
    if !stats.is_clean() {
        println!(
            "Warning: {} short write(s), {} failed seek(s)",
            stats.mismatches, stats.seek_failures
        );
    }
}

fn copy_job(image: &ImageArgs) -> CopyJob {
    CopyJob::new(&image.input, &image.device)
        .with_seek(image.seek)
        .with_skip(image.skip)
}

/// Run the full unlock / copy / relock / enable-boot sequence
pub fn run_flash(
    partition: &BootPartition,
    image: &ImageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Flashing {} to {} (seek={}, skip={})",
        image.input.display(),
        image.device.display(),
        image.seek,
        image.skip
    );

    let job = copy_job(image);
    let mut progress = IndicatifProgress::new("Writing");
    let report = flash_bootloader(partition, &job, &mut progress)?;

    if report.has_warnings() {
        println!("Bootloader written with warnings, boot enabled");
    } else {
        println!("Bootloader written, boot enabled");
    }
    Ok(())
}

/// Copy an image without touching the sysfs controls
pub fn run_copy(
    partition: &BootPartition,
    image: &ImageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = copy_job(image).with_chunk_size(partition.chunk_size);
    let mut progress = IndicatifProgress::new("Copying");
    update_bootloader(&job, &mut progress)?;
    Ok(())
}

/// Invoke a registered updater function
pub fn run_call(
    partition: &BootPartition,
    name: &str,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let mut progress = IndicatifProgress::new("Writing");
    let result = call_function(name, &args, partition, &mut progress)?;
    println!("{} returned {:?}", name, result);
    Ok(())
}

/// List all registered updater functions
pub fn list_functions() {
    println!("Registered updater functions:");
    println!();
    for function in registered_functions() {
        println!("  {}({})", function.name, function.args.join(", "));
        println!("      {}", function.description);
    }
}

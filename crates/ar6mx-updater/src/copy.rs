//! Bootloader image copier
//!
//! Streams a bootloader image into a raw block device (typically an eMMC
//! boot partition) at a byte offset, in fixed-size chunks.
//!
//! Seek failures and short writes are logged and counted, but they do not
//! stop the copy. A flash that reports either may be misaligned or
//! incomplete; [`CopyStats`] exposes the counts so callers can decide.
//! No verification pass is performed.

use crate::error::CopyError;
use log::{debug, error, info, trace, warn};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Copy block size in bytes
pub const COPY_CHUNK_SIZE: usize = 1024;

/// A single image copy request
#[derive(Debug, Clone)]
pub struct CopyJob {
    /// Image to read from
    pub source: PathBuf,
    /// Block device (or file) to write into
    pub destination: PathBuf,
    /// Destination offset in bytes
    pub seek: u64,
    /// Source offset in bytes
    pub skip: u64,
    /// Chunk size used for each read/write pair
    pub chunk_size: usize,
}

impl CopyJob {
    /// Create a job copying the whole source to the start of the destination
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            seek: 0,
            skip: 0,
            chunk_size: COPY_CHUNK_SIZE,
        }
    }

    /// Set the destination offset
    pub fn with_seek(mut self, seek: u64) -> Self {
        self.seek = seek;
        self
    }

    /// Set the source offset
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Set the chunk size (zero falls back to [`COPY_CHUNK_SIZE`])
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            COPY_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }
}

/// Outcome of a completed copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Bytes read from the source
    pub bytes_read: u64,
    /// Bytes accepted by the destination
    pub bytes_written: u64,
    /// Chunks where fewer bytes were written than read
    pub mismatches: u32,
    /// Number of seeks (source or destination) that failed
    pub seek_failures: u32,
}

impl CopyStats {
    /// True when every chunk landed and both seeks succeeded
    pub fn is_clean(&self) -> bool {
        self.mismatches == 0 && self.seek_failures == 0 && self.bytes_read == self.bytes_written
    }
}

/// Progress callback for [`update_bootloader`]
pub trait CopyProgress {
    /// Called once both files are open; `total` is the expected byte count
    /// when the source size is known
    fn started(&mut self, total: Option<u64>);

    /// Called after every chunk with the running total of bytes written
    fn progress(&mut self, written: u64);

    /// Called when a chunk was only partially written
    fn mismatch(&mut self, _read: usize, _written: usize) {}

    /// Called once the copy loop has finished
    fn finished(&mut self, stats: &CopyStats);
}

/// Progress sink that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl CopyProgress for NoProgress {
    fn started(&mut self, _total: Option<u64>) {}
    fn progress(&mut self, _written: u64) {}
    fn finished(&mut self, _stats: &CopyStats) {}
}

/// Copy `job.source` (from `job.skip`) into `job.destination` (at `job.seek`)
///
/// The destination is created if it does not exist and is never truncated,
/// so bytes before `seek` keep their content.
///
/// # Errors
/// - [`CopyError::SourceOpen`] if the image cannot be opened; the
///   destination is not touched
/// - [`CopyError::DestinationOpen`] if the device cannot be opened
/// - [`CopyError::Read`] if the image fails mid-stream
pub fn update_bootloader<P: CopyProgress + ?Sized>(
    job: &CopyJob,
    progress: &mut P,
) -> Result<CopyStats, CopyError> {
    let mut src = File::open(&job.source).map_err(|e| CopyError::SourceOpen {
        path: job.source.clone(),
        source: e,
    })?;
    info!("Successfully opened source file {}", job.source.display());

    // `src` is dropped (closed) on the early return below
    let mut dst = OpenOptions::new()
        .write(true)
        .create(true)
        .open(&job.destination)
        .map_err(|e| CopyError::DestinationOpen {
            path: job.destination.clone(),
            source: e,
        })?;
    info!(
        "Successfully opened destination path {}",
        job.destination.display()
    );

    let mut stats = CopyStats::default();

    match dst.seek(SeekFrom::Start(job.seek)) {
        Ok(_) => debug!("Destination seek to {} returned okay", job.seek),
        Err(e) => {
            error!("Error with destination seek to {}: {}", job.seek, e);
            stats.seek_failures += 1;
        }
    }

    match src.seek(SeekFrom::Start(job.skip)) {
        Ok(_) => debug!("Source seek to {} returned okay", job.skip),
        Err(e) => {
            error!("Error with source seek to {}: {}", job.skip, e);
            stats.seek_failures += 1;
        }
    }

    info!(
        "Writing bootloader image {} to {} with seek={} skip={}",
        job.source.display(),
        job.destination.display(),
        job.seek,
        job.skip
    );

    progress.started(remaining_len(&src, job.skip));

    let mut buf = vec![0u8; job.chunk_size.max(1)];
    loop {
        let read = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CopyError::Read {
                    path: job.source.clone(),
                    copied: stats.bytes_written,
                    source: e,
                });
            }
        };
        stats.bytes_read += read as u64;

        let written = write_chunk(&mut dst, &buf[..read]);
        stats.bytes_written += written as u64;

        if written != read {
            error!(
                "Mismatch in copying {} to {}, read={} written={}",
                job.source.display(),
                job.destination.display(),
                read,
                written
            );
            stats.mismatches += 1;
            progress.mismatch(read, written);
        } else {
            trace!("written={}, total={}", written, stats.bytes_written);
        }
        progress.progress(stats.bytes_written);
    }

    if let Err(e) = dst.sync_all() {
        warn!("Failed to sync {}: {}", job.destination.display(), e);
    }

    progress.finished(&stats);
    info!(
        "Bootloader copy complete: {} of {} bytes written",
        stats.bytes_written, stats.bytes_read
    );

    Ok(stats)
}

/// Write one chunk, returning how many bytes the destination accepted
fn write_chunk(dst: &mut File, data: &[u8]) -> usize {
    let mut written = 0;
    while written < data.len() {
        match dst.write(&data[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Write failed after {} bytes of chunk: {}", written, e);
                break;
            }
        }
    }
    written
}

/// Bytes left in `src` after `skip`, if the size is known
fn remaining_len(src: &File, skip: u64) -> Option<u64> {
    let len = src.metadata().ok()?.len();
    // Block devices report a zero length through metadata
    if len == 0 {
        return None;
    }
    Some(len.saturating_sub(skip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn copy_image(
        source: &Path,
        destination: &Path,
        seek: u64,
        skip: u64,
    ) -> Result<CopyStats, CopyError> {
        let job = CopyJob::new(source, destination).with_seek(seek).with_skip(skip);
        update_bootloader(&job, &mut NoProgress)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[derive(Default)]
    struct Recorder {
        total: Option<u64>,
        last: u64,
        calls: usize,
        finished: Option<CopyStats>,
    }

    impl CopyProgress for Recorder {
        fn started(&mut self, total: Option<u64>) {
            self.total = total;
        }
        fn progress(&mut self, written: u64) {
            self.last = written;
            self.calls += 1;
        }
        fn finished(&mut self, stats: &CopyStats) {
            self.finished = Some(*stats);
        }
    }

    #[test]
    fn test_copy_whole_image() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("u-boot.imx");
        let dst = dir.path().join("mmcblk3boot0");
        let data = pattern(5000);
        fs::write(&src, &data).unwrap();

        let stats = copy_image(&src, &dst, 0, 0).unwrap();
        assert_eq!(stats.bytes_read, 5000);
        assert_eq!(stats.bytes_written, 5000);
        assert!(stats.is_clean());

        let out = fs::read(&dst).unwrap();
        assert_eq!(&out[..data.len()], &data[..]);
    }

    #[test]
    fn test_copy_with_skip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        let dst = dir.path().join("dev");
        let data = pattern(3000);
        fs::write(&src, &data).unwrap();

        copy_image(&src, &dst, 0, 1024).unwrap();

        let out = fs::read(&dst).unwrap();
        assert_eq!(out, &data[1024..]);
    }

    #[test]
    fn test_copy_with_seek_preserves_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        let dst = dir.path().join("dev");
        let data = pattern(2048);
        fs::write(&src, &data).unwrap();
        fs::write(&dst, vec![0xEEu8; 4096]).unwrap();

        copy_image(&src, &dst, 1024, 0).unwrap();

        let out = fs::read(&dst).unwrap();
        assert_eq!(out.len(), 4096);
        assert!(out[..1024].iter().all(|&b| b == 0xEE));
        assert_eq!(&out[1024..3072], &data[..]);
        assert!(out[3072..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_missing_source_leaves_destination_alone() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing.imx");
        let dst = dir.path().join("dev");

        let err = copy_image(&src, &dst, 0, 0).unwrap_err();
        assert!(matches!(err, CopyError::SourceOpen { .. }));
        assert!(err.code() < 0);
        assert!(!dst.exists());
    }

    #[test]
    fn test_unopenable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        fs::write(&src, pattern(16)).unwrap();
        let dst = dir.path().join("no-such-dir").join("dev");

        let err = copy_image(&src, &dst, 0, 0).unwrap_err();
        assert!(matches!(err, CopyError::DestinationOpen { .. }));
        assert_eq!(err.code(), -2);
    }

    #[test]
    fn test_skip_past_end_copies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        let dst = dir.path().join("dev");
        fs::write(&src, pattern(100)).unwrap();

        let stats = copy_image(&src, &dst, 0, 4096).unwrap();
        assert_eq!(stats.bytes_written, 0);
        assert_eq!(fs::read(&dst).unwrap().len(), 0);
    }

    #[test]
    fn test_progress_events() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        let dst = dir.path().join("dev");
        fs::write(&src, pattern(2500)).unwrap();

        let job = CopyJob::new(&src, &dst).with_skip(500).with_chunk_size(512);
        let mut rec = Recorder::default();
        let stats = update_bootloader(&job, &mut rec).unwrap();

        assert_eq!(rec.total, Some(2000));
        assert_eq!(rec.last, 2000);
        assert_eq!(rec.calls, 4);
        assert_eq!(rec.finished, Some(stats));
    }

    #[test]
    fn test_short_write_is_not_fatal() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        fs::write(&src, pattern(3000)).unwrap();

        // Every write to /dev/full fails with ENOSPC
        let job = CopyJob::new(&src, full);
        let mut rec = Recorder::default();
        let stats = update_bootloader(&job, &mut rec).unwrap();
        assert_eq!(stats.bytes_read, 3000);
        assert_eq!(stats.bytes_written, 0);
        assert_eq!(stats.mismatches, 3);
        assert!(!stats.is_clean());
        // Every chunk is still reported and the copy runs to the end
        assert_eq!(rec.calls, 3);
        assert_eq!(rec.finished, Some(stats));
    }

    #[test]
    fn test_seek_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("image.bin");
        let dst = dir.path().join("dev");
        let data = pattern(1500);
        fs::write(&src, &data).unwrap();

        // Offset beyond i64::MAX is rejected by lseek; the copy lands at 0
        let stats = copy_image(&src, &dst, u64::MAX, 0).unwrap();
        assert_eq!(stats.seek_failures, 1);
        assert_eq!(stats.mismatches, 0);
        assert_eq!(stats.bytes_written, 1500);
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn test_zero_chunk_size_uses_default() {
        let job = CopyJob::new("a", "b").with_chunk_size(0);
        assert_eq!(job.chunk_size, COPY_CHUNK_SIZE);
    }
}

//! Benchmark target handling
//!
//! Opens the benchmark file or block device with the access mode each phase
//! needs, sizes block devices via ioctl, and drops the OS page cache before
//! cold-read phases.
//!
//! Open semantics per phase:
//!
//! - read phases: read-only
//! - sequential write, file target: write + create + truncate, so a re-run
//!   always rebuilds the target from offset zero
//! - sequential write, device target: write only; devices are never created
//!   or truncated, only a bounded span is overwritten
//! - random write: write (+ create for files) with `O_SYNC`, so every write
//!   is synchronous and the phase measures durable-write latency by design

use crate::config::PhaseMode;
use crate::error::BenchError;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;

// ioctl request code for getting block device size
const BLKGETSIZE64: libc::c_ulong = 0x8008_1272;

/// Kind of benchmark target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Regular file; created and truncated by the sequential write phase
    File,
    /// Raw block device; pre-existing, fixed extent, never truncated
    Device,
}

/// Open the target with the access mode `mode` requires
pub fn open_target(path: &Path, kind: TargetKind, mode: PhaseMode) -> Result<File, BenchError> {
    let mut options = OpenOptions::new();

    match mode {
        PhaseMode::SequentialRead | PhaseMode::RandomRead => {
            options.read(true);
        }
        PhaseMode::SequentialWrite => {
            options.write(true);
            if kind == TargetKind::File {
                options.create(true).truncate(true);
            }
        }
        PhaseMode::RandomWrite => {
            options.write(true).custom_flags(libc::O_SYNC);
            if kind == TargetKind::File {
                options.create(true);
            }
        }
    }

    options.open(path).map_err(|source| BenchError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Detect a block device's size in bytes via `BLKGETSIZE64`
pub fn device_size(file: &File) -> crate::Result<u64> {
    let mut size: u64 = 0;
    let result = unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64, &mut size) };

    if result < 0 {
        let err = std::io::Error::last_os_error();
        return Err(err).context("ioctl(BLKGETSIZE64) failed");
    }

    Ok(size)
}

/// Ask the kernel to drop the page cache
///
/// Called before read phases so cold-cache numbers are measured. Failure
/// (no permission, not Linux) is silently ignored: the measurement degrades
/// gracefully to warm-cache.
pub fn drop_page_cache() {
    let _ = std::fs::write("/proc/sys/vm/drop_caches", b"1\n");
}

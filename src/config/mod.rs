//! Benchmark configuration
//!
//! [`BenchConfig`] is the validated, run-wide configuration built from the
//! CLI. [`TestPhaseConfig`] is the immutable per-phase slice of it that the
//! coordinator and workers consume; the runner creates one per phase.

pub mod cli;

use crate::config::cli::Cli;
use crate::target::TargetKind;
use std::path::PathBuf;
use std::time::Duration;

/// Hard cap on worker threads
pub const MAX_THREADS: usize = 256;

/// Block size used by both sequential phases
pub const SEQUENTIAL_BLOCK_BYTES: u64 = 128 * 1024;

/// Access pattern and direction of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseMode {
    SequentialWrite,
    SequentialRead,
    RandomWrite,
    RandomRead,
}

impl PhaseMode {
    pub fn is_read(self) -> bool {
        matches!(self, PhaseMode::SequentialRead | PhaseMode::RandomRead)
    }

    pub fn is_write(self) -> bool {
        !self.is_read()
    }

    pub fn is_sequential(self) -> bool {
        matches!(self, PhaseMode::SequentialWrite | PhaseMode::SequentialRead)
    }

    pub fn is_random(self) -> bool {
        !self.is_sequential()
    }

    /// Pattern column label for the status line
    pub fn pattern_label(self) -> &'static str {
        if self.is_sequential() {
            "Seqn."
        } else {
            "Randm"
        }
    }

    /// Direction column label for the status line
    pub fn direction_label(self) -> &'static str {
        if self.is_write() {
            "Write"
        } else {
            "Read"
        }
    }
}

/// Immutable configuration of a single phase
///
/// Bounded phases (`total_bytes_bound` set) end when the aggregate byte
/// volume is reached; duration phases end when `duration` elapses.
#[derive(Debug, Clone)]
pub struct TestPhaseConfig {
    pub mode: PhaseMode,
    pub block_size_bytes: u64,
    /// Logical extent the phase operates within (random offsets stay below it)
    pub target_file_size_bytes: u64,
    pub total_bytes_bound: Option<u64>,
    pub duration: Duration,
    pub thread_count: usize,
    /// Delay before a worker starts timed work, letting all threads reach a
    /// comparable starting line
    pub startle_delay: Duration,
}

impl TestPhaseConfig {
    pub fn is_bounded(&self) -> bool {
        self.total_bytes_bound.is_some()
    }

    /// Byte quota per worker thread
    ///
    /// Integer truncation leaves up to `thread_count - 1` bytes of the bound
    /// unassigned; that drift is accepted.
    pub fn per_thread_quota(&self) -> Option<u64> {
        self.total_bytes_bound
            .map(|bound| bound / self.thread_count as u64)
    }
}

/// Validated run-wide configuration
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub target: PathBuf,
    pub kind: TargetKind,
    /// Block size of the random phases
    pub block_size_bytes: u64,
    /// Target extent (`-s`, in bytes)
    pub target_size_bytes: u64,
    /// Wall-clock budget of each duration-bounded phase
    pub run_time: Duration,
    /// Thread count of the random phases
    pub thread_count: usize,
    /// Byte bound of the sequential phases: the target extent for files, the
    /// explicit `--write-size` span for devices
    pub sequential_bound_bytes: u64,
    pub seed: u32,
    pub debug: bool,
}

impl BenchConfig {
    /// Build a run configuration from validated CLI arguments
    pub fn from_cli(cli: &Cli) -> crate::Result<Self> {
        cli.validate()?;

        let (target, kind) = match &cli.device {
            Some(device) => (device.clone(), TargetKind::Device),
            None => (cli.path.clone(), TargetKind::File),
        };

        let target_size_bytes = cli.size << 30;
        let sequential_bound_bytes = match (kind, cli.write_size) {
            (TargetKind::Device, Some(mb)) => mb << 20,
            _ => target_size_bytes,
        };

        Ok(Self {
            target,
            kind,
            block_size_bytes: cli.block_size << 10,
            target_size_bytes,
            run_time: Duration::from_secs(cli.run_time),
            thread_count: cli.threads,
            sequential_bound_bytes,
            seed: cli.seed.unwrap_or_else(rand::random),
            debug: cli.debug,
        })
    }
}

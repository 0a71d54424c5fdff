//! Worker thread implementation
//!
//! Each worker executes one thread's slice of a single phase: the I/O loop
//! appropriate to the phase's mode, updating its own progress counters as it
//! goes. Counters are single-writer: only the owning thread increments them,
//! and only the coordinator's poll loop reads them, so plain atomics with
//! relaxed ordering are enough (the requirement is no torn reads, not a
//! consistent cross-thread snapshot).
//!
//! Workers never abort the process. Any short transfer or OS error is
//! returned to the coordinator, which joins every thread before surfacing it.

use crate::config::{PhaseMode, TestPhaseConfig};
use crate::error::BenchError;
use crate::rng::RandomStream;
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::fs::FileExt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const STOPPED: u8 = 0;
const STARTING: u8 = 1;
const RUNNING: u8 = 2;

/// Broadcast run state shared by the coordinator and every worker
///
/// The coordinator writes it, workers poll it at the top of each loop
/// iteration. `Starting` is the multi-thread pre-roll window: workers perform
/// I/O but duration-phase workers do not yet accumulate counters, so
/// slow-to-start threads cannot skew the measured window.
#[derive(Debug)]
pub struct PhaseSignal(AtomicU8);

impl PhaseSignal {
    pub fn new(with_preroll: bool) -> Self {
        Self(AtomicU8::new(if with_preroll { STARTING } else { RUNNING }))
    }

    /// End the pre-roll: counters accumulate from here on
    pub fn set_running(&self) {
        self.0.store(RUNNING, Ordering::Release);
    }

    /// Broadcast cancellation; workers observe it within one loop iteration
    pub fn stop(&self) {
        self.0.store(STOPPED, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire) == STOPPED
    }

    pub fn is_starting(&self) -> bool {
        self.0.load(Ordering::Acquire) == STARTING
    }
}

/// Per-thread progress record
///
/// Allocated once by the coordinator and reused across phases; `reset()`
/// re-arms it at phase start. Exactly one worker thread ever writes a given
/// instance during a phase.
///
/// Timestamps are stored as nanoseconds since the phase epoch, offset by one
/// so that zero means "not set"; this keeps the whole record lock-free.
#[derive(Debug)]
pub struct WorkerState {
    thread_index: usize,
    bytes_done: AtomicU64,
    ops_done: AtomicU64,
    finished: AtomicBool,
    started_at_nanos: AtomicU64,
    finished_at_nanos: AtomicU64,
    per_thread_byte_quota: AtomicU64,
}

impl WorkerState {
    pub fn new(thread_index: usize) -> Self {
        Self {
            thread_index,
            bytes_done: AtomicU64::new(0),
            ops_done: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            started_at_nanos: AtomicU64::new(0),
            finished_at_nanos: AtomicU64::new(0),
            per_thread_byte_quota: AtomicU64::new(0),
        }
    }

    /// Re-arm the record for a new phase
    ///
    /// Only called between phases, when no worker thread holds the record.
    pub fn reset(&self, quota: u64) {
        self.bytes_done.store(0, Ordering::Relaxed);
        self.ops_done.store(0, Ordering::Relaxed);
        self.finished.store(false, Ordering::Release);
        self.started_at_nanos.store(0, Ordering::Relaxed);
        self.finished_at_nanos.store(0, Ordering::Relaxed);
        self.per_thread_byte_quota.store(quota, Ordering::Relaxed);
    }

    pub fn thread_index(&self) -> usize {
        self.thread_index
    }

    pub fn bytes_done(&self) -> u64 {
        self.bytes_done.load(Ordering::Relaxed)
    }

    pub fn ops_done(&self) -> u64 {
        self.ops_done.load(Ordering::Relaxed)
    }

    pub fn quota(&self) -> u64 {
        self.per_thread_byte_quota.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Nanoseconds after the phase epoch at which this worker started timed
    /// work, or `None` if it has not started yet
    pub fn started_at_nanos(&self) -> Option<u64> {
        match self.started_at_nanos.load(Ordering::Relaxed) {
            0 => None,
            n => Some(n - 1),
        }
    }

    pub fn finished_at_nanos(&self) -> Option<u64> {
        match self.finished_at_nanos.load(Ordering::Relaxed) {
            0 => None,
            n => Some(n - 1),
        }
    }

    /// This worker's own start-to-finish window
    pub fn run_window(&self) -> Option<Duration> {
        let start = self.started_at_nanos()?;
        let end = self.finished_at_nanos()?;
        Some(Duration::from_nanos(end.saturating_sub(start)))
    }

    fn record_op(&self, bytes: u64) {
        self.bytes_done.fetch_add(bytes, Ordering::Relaxed);
        self.ops_done.fetch_add(1, Ordering::Relaxed);
    }

    fn mark_started(&self, epoch: Instant) {
        let nanos = epoch.elapsed().as_nanos() as u64;
        self.started_at_nanos.store(nanos + 1, Ordering::Relaxed);
    }

    fn mark_finished(&self, epoch: Instant) {
        let nanos = epoch.elapsed().as_nanos() as u64;
        self.finished_at_nanos.store(nanos + 1, Ordering::Relaxed);
        self.finished.store(true, Ordering::Release);
    }
}

/// One phase's execution unit for one thread
pub struct Worker {
    state: Arc<WorkerState>,
    config: Arc<TestPhaseConfig>,
    file: Arc<File>,
    payload: Arc<Vec<u8>>,
    signal: Arc<PhaseSignal>,
    rng: RandomStream,
    epoch: Instant,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: Arc<WorkerState>,
        config: Arc<TestPhaseConfig>,
        file: Arc<File>,
        payload: Arc<Vec<u8>>,
        signal: Arc<PhaseSignal>,
        rng: RandomStream,
        epoch: Instant,
    ) -> Self {
        Self {
            state,
            config,
            file,
            payload,
            signal,
            rng,
            epoch,
        }
    }

    /// Run the phase loop to completion
    ///
    /// `finished` is set on every exit path, including errors, so the
    /// coordinator's poll loop always converges.
    pub fn run(mut self) -> Result<(), BenchError> {
        let result = self.execute();
        self.state.mark_finished(self.epoch);
        result
    }

    fn execute(&mut self) -> Result<(), BenchError> {
        if !self.config.startle_delay.is_zero() {
            thread::sleep(self.config.startle_delay);
        }

        let block = self.config.block_size_bytes as usize;
        let mut read_buf = vec![0u8; block];
        debug_assert!(block <= self.payload.len());

        self.state.mark_started(self.epoch);

        // Duration phases time themselves from the first counted iteration,
        // not from thread start, so the pre-roll never shrinks the window.
        let mut timed_start: Option<Instant> = None;

        loop {
            if self.signal.is_stopped() {
                break;
            }
            if let Some(quota) = self.config.per_thread_quota() {
                if self.state.bytes_done() >= quota {
                    break;
                }
            } else if let Some(started) = timed_start {
                if started.elapsed() >= self.config.duration {
                    break;
                }
            }

            match self.config.mode {
                PhaseMode::SequentialWrite => self.sequential_write(block)?,
                PhaseMode::SequentialRead => self.sequential_read(&mut read_buf)?,
                PhaseMode::RandomWrite => self.random_write(block)?,
                PhaseMode::RandomRead => self.random_read(&mut read_buf)?,
            }

            // Pre-roll iterations of duration phases do the I/O but are not
            // counted, so the measured window starts with all threads active.
            if self.config.is_bounded() || !self.signal.is_starting() {
                if timed_start.is_none() {
                    timed_start = Some(Instant::now());
                }
                self.state.record_op(block as u64);
            }
        }

        if self.config.is_bounded() && self.config.mode.is_write() {
            self.file.sync_all().map_err(|source| BenchError::Io {
                op: "fsync",
                offset: 0,
                source,
            })?;
        }

        Ok(())
    }

    /// Write one block at the shared file cursor (single-threaded phases only)
    fn sequential_write(&mut self, block: usize) -> Result<(), BenchError> {
        let mut cursor: &File = &self.file;
        let done = cursor
            .write(&self.payload[..block])
            .map_err(|source| BenchError::Io {
                op: "write",
                offset: self.state.bytes_done(),
                source,
            })?;
        Self::require_full("write", self.state.bytes_done(), block, done)
    }

    /// Read one block at the shared file cursor (single-threaded phases only)
    fn sequential_read(&mut self, buf: &mut [u8]) -> Result<(), BenchError> {
        let mut cursor: &File = &self.file;
        let done = cursor.read(buf).map_err(|source| BenchError::Io {
            op: "read",
            offset: self.state.bytes_done(),
            source,
        })?;
        Self::require_full("read", self.state.bytes_done(), buf.len(), done)
    }

    /// Positioned write of one block at a random aligned offset
    ///
    /// The payload slice is itself picked at random from the shared buffer so
    /// successive writes carry varied data. The fd is opened O_SYNC, so each
    /// write is durable before it returns (durable random write).
    fn random_write(&mut self, block: usize) -> Result<(), BenchError> {
        let offset = self.pick_offset();
        let payload_blocks = self.payload.len() / block;
        let payload_at = (self.rng.next_u32() as usize % payload_blocks) * block;
        let slice = &self.payload[payload_at..payload_at + block];

        let done = self
            .file
            .write_at(slice, offset)
            .map_err(|source| BenchError::Io {
                op: "pwrite",
                offset,
                source,
            })?;
        Self::require_full("pwrite", offset, block, done)
    }

    /// Positioned read of one block at a random aligned offset
    fn random_read(&mut self, buf: &mut [u8]) -> Result<(), BenchError> {
        let offset = self.pick_offset();
        let done = self
            .file
            .read_at(buf, offset)
            .map_err(|source| BenchError::Io {
                op: "pread",
                offset,
                source,
            })?;
        Self::require_full("pread", offset, buf.len(), done)
    }

    fn pick_offset(&mut self) -> u64 {
        self.rng.block_offset(
            self.config.target_file_size_bytes,
            self.config.block_size_bytes,
        )
    }

    fn require_full(
        op: &'static str,
        offset: u64,
        requested: usize,
        transferred: usize,
    ) -> Result<(), BenchError> {
        if transferred == requested {
            Ok(())
        } else {
            Err(BenchError::ShortIo {
                op,
                offset,
                requested,
                transferred,
            })
        }
    }
}

//! Phase coordination
//!
//! The coordinator runs exactly one phase to completion: it resets the
//! per-thread state records, spawns the worker threads, polls their counters
//! once per tick to render a status line, flips the shared signal to stop
//! duration phases on time, and joins every worker before returning.
//!
//! State records are allocated once and reused across phases, so a four-phase
//! run performs no per-phase state allocation. The aggregate view is a value
//! computed by the stats module, never a sentinel slot in the state array.

use crate::config::TestPhaseConfig;
use crate::error::BenchError;
use crate::rng::RandomStream;
use crate::stats;
use crate::worker::{PhaseSignal, Worker, WorkerState};
use anyhow::Context;
use std::fs::File;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Startup countdown ticks before a multi-thread phase counts bytes
const PREROLL_TICKS: u32 = 3;

/// Aggregate outcome of one completed phase
#[derive(Debug, Clone, Copy)]
pub struct PhaseResult {
    pub bytes_done: u64,
    pub ops_done: u64,
    pub elapsed: Duration,
}

/// Runs one [`TestPhaseConfig`] at a time against an open target
pub struct PhaseCoordinator {
    states: Vec<Arc<WorkerState>>,
    poll_interval: Duration,
}

impl PhaseCoordinator {
    /// Create a coordinator able to run up to `max_threads` workers
    pub fn new(max_threads: usize) -> Self {
        Self {
            states: (0..max_threads)
                .map(|i| Arc::new(WorkerState::new(i)))
                .collect(),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Override the poll tick (status updates and pre-roll countdown)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Per-thread state records, for post-phase inspection
    pub fn states(&self) -> &[Arc<WorkerState>] {
        &self.states
    }

    /// Run one phase to completion and report its aggregate result
    ///
    /// Joins every worker before returning; the first worker error surfaces
    /// only after all threads have been joined, so no thread is left running
    /// on the failure path.
    pub fn run_phase(
        &mut self,
        file: File,
        config: &TestPhaseConfig,
        payload: Arc<Vec<u8>>,
        base_seed: u32,
    ) -> crate::Result<PhaseResult> {
        let thread_count = config.thread_count;
        if thread_count == 0 || thread_count > self.states.len() {
            return Err(BenchError::InvalidConfig(format!(
                "thread count {} outside 1..={}",
                thread_count,
                self.states.len()
            ))
            .into());
        }
        if config.block_size_bytes == 0
            || config.block_size_bytes > payload.len() as u64
            || config.block_size_bytes > config.target_file_size_bytes
        {
            return Err(BenchError::InvalidConfig(format!(
                "block size {} bytes outside 1..={}",
                config.block_size_bytes,
                payload.len()
            ))
            .into());
        }

        let config = Arc::new(config.clone());
        let file = Arc::new(file);
        let quota = config.per_thread_quota().unwrap_or(0);
        let signal = Arc::new(PhaseSignal::new(thread_count > 1));
        let epoch = Instant::now();

        let states = &self.states[..thread_count];
        let mut handles = Vec::with_capacity(thread_count);
        for state in states {
            state.reset(quota);
            let worker = Worker::new(
                state.clone(),
                config.clone(),
                file.clone(),
                payload.clone(),
                signal.clone(),
                RandomStream::seeded(base_seed.wrapping_add(state.thread_index() as u32)),
                epoch,
            );
            let handle = thread::Builder::new()
                .name(format!("mozzio-worker-{}", state.thread_index()))
                .spawn(move || worker.run())
                .context("failed to spawn worker thread")?;
            handles.push(handle);
        }

        // Multi-thread phases count down while slow-to-start threads come up,
        // then flip to running so all threads share the measured window.
        if thread_count > 1 {
            for tick in (1..=PREROLL_TICKS).rev() {
                let snapshot = stats::aggregate(states);
                let countdown = -(tick as f64) * self.poll_interval.as_secs_f64();
                stats::print_status(&stats::format_status(&config, &snapshot, countdown, ""));
                thread::sleep(self.poll_interval);
            }
            signal.set_running();
        }

        let phase_start = Instant::now();
        let mut stop_time: Option<Instant> = None;
        let snapshot = loop {
            if !config.is_bounded() && stop_time.is_none() && phase_start.elapsed() >= config.duration
            {
                stop_time = Some(Instant::now());
                signal.stop();
            }

            thread::sleep(self.poll_interval);

            let snapshot = stats::aggregate(states);
            let elapsed = phase_start.elapsed().as_secs_f64();
            stats::print_status(&stats::format_status(&config, &snapshot, elapsed, ""));
            if snapshot.unfinished == 0 {
                break snapshot;
            }
        };
        signal.stop();

        let mut first_error: Option<BenchError> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                Err(_) => return Err(anyhow::anyhow!("worker thread panicked")),
            }
        }
        if let Some(err) = first_error {
            eprintln!();
            return Err(err.into());
        }

        // The coordinator's own stop time is authoritative for duration
        // phases; bounded phases use the workers' own start/finish stamps.
        let elapsed = if config.is_bounded() {
            workers_window(states).unwrap_or_else(|| phase_start.elapsed())
        } else {
            match stop_time {
                Some(stop) => stop.duration_since(phase_start),
                None => phase_start.elapsed(),
            }
        };

        stats::print_status(&stats::format_status(
            &config,
            &snapshot,
            elapsed.as_secs_f64(),
            "OK  ",
        ));
        eprintln!();

        Ok(PhaseResult {
            bytes_done: snapshot.bytes_done,
            ops_done: snapshot.ops_done,
            elapsed,
        })
    }
}

/// Earliest worker start to latest worker finish
fn workers_window(states: &[Arc<WorkerState>]) -> Option<Duration> {
    let start = states.iter().filter_map(|s| s.started_at_nanos()).min()?;
    let end = states.iter().filter_map(|s| s.finished_at_nanos()).max()?;
    Some(Duration::from_nanos(end.saturating_sub(start)))
}

//! Four-phase benchmark orchestration
//!
//! The runner sequences the fixed phase order against one target: sequential
//! write, sequential read, random write, random read. Each phase runs to
//! completion before the next starts, and the first fatal error aborts the
//! remainder. The page cache is dropped before each read phase so cold-cache
//! numbers are measured.

use crate::config::{BenchConfig, PhaseMode, TestPhaseConfig, SEQUENTIAL_BLOCK_BYTES};
use crate::coordinator::PhaseCoordinator;
use crate::error::BenchError;
use crate::rng::{fill_random_data, RANDOM_DATA_BYTES};
use crate::stats;
use crate::target::{self, TargetKind};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

pub struct BenchmarkRunner {
    config: BenchConfig,
    coordinator: PhaseCoordinator,
    payload: Arc<Vec<u8>>,
}

impl BenchmarkRunner {
    /// Build a runner, deriving the shared write payload from the seed once
    /// for the whole run
    pub fn new(config: BenchConfig) -> Self {
        let payload = Arc::new(fill_random_data(config.seed, RANDOM_DATA_BYTES));
        let coordinator = PhaseCoordinator::new(config.thread_count);
        Self {
            config,
            coordinator,
            payload,
        }
    }

    /// Run all four phases in order
    pub fn run(&mut self) -> crate::Result<()> {
        stats::print_status_header();

        for (index, phase) in self.phases().iter().enumerate() {
            if phase.mode.is_read() {
                target::drop_page_cache();
            }

            let file = target::open_target(&self.config.target, self.config.kind, phase.mode)?;
            if index == 0 && self.config.kind == TargetKind::Device {
                self.check_device_extent(&file)?;
            }

            let seed = phase_seed(self.config.seed, index as u32);
            let result = self
                .coordinator
                .run_phase(file, phase, self.payload.clone(), seed)?;

            if self.config.debug {
                eprintln!(
                    "DEBUG: phase {} complete: {} bytes, {} ops in {:.3}s",
                    index + 1,
                    result.bytes_done,
                    result.ops_done,
                    result.elapsed.as_secs_f64()
                );
            }
        }

        Ok(())
    }

    /// The fixed four-phase sequence
    ///
    /// Sequential phases run one thread with 128 kB blocks, bounded by the
    /// target extent (or the explicit write volume for devices). Random
    /// phases run the configured thread count and block size for the
    /// configured wall-clock budget.
    fn phases(&self) -> [TestPhaseConfig; 4] {
        let c = &self.config;
        let startle = Duration::from_secs(1);

        let sequential = |mode| TestPhaseConfig {
            mode,
            block_size_bytes: SEQUENTIAL_BLOCK_BYTES,
            target_file_size_bytes: c.target_size_bytes,
            total_bytes_bound: Some(c.sequential_bound_bytes),
            duration: c.run_time,
            thread_count: 1,
            startle_delay: startle,
        };
        let random = |mode| TestPhaseConfig {
            mode,
            block_size_bytes: c.block_size_bytes,
            target_file_size_bytes: c.target_size_bytes,
            total_bytes_bound: None,
            duration: c.run_time,
            thread_count: c.thread_count,
            startle_delay: startle,
        };

        [
            sequential(PhaseMode::SequentialWrite),
            sequential(PhaseMode::SequentialRead),
            random(PhaseMode::RandomWrite),
            random(PhaseMode::RandomRead),
        ]
    }

    /// Reject configurations whose extent or write volume overruns the device
    fn check_device_extent(&self, file: &File) -> crate::Result<()> {
        let extent = target::device_size(file)?;
        if self.config.sequential_bound_bytes > extent {
            return Err(BenchError::InvalidConfig(format!(
                "write size {} exceeds device extent {} bytes",
                self.config.sequential_bound_bytes, extent
            ))
            .into());
        }
        if self.config.target_size_bytes > extent {
            return Err(BenchError::InvalidConfig(format!(
                "target size {} exceeds device extent {} bytes",
                self.config.target_size_bytes, extent
            ))
            .into());
        }
        Ok(())
    }
}

/// Per-phase salt so each phase draws a distinct offset stream from one seed
fn phase_seed(seed: u32, index: u32) -> u32 {
    seed ^ index.wrapping_mul(0x9E37_79B9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> BenchConfig {
        BenchConfig {
            target: PathBuf::from("mozzio.bin"),
            kind: TargetKind::File,
            block_size_bytes: 4096,
            target_size_bytes: 10 << 30,
            run_time: Duration::from_secs(30),
            thread_count: 128,
            sequential_bound_bytes: 10 << 30,
            seed: 1,
            debug: false,
        }
    }

    #[test]
    fn test_phase_sequence() {
        let runner = BenchmarkRunner::new(config());
        let phases = runner.phases();

        assert_eq!(phases[0].mode, PhaseMode::SequentialWrite);
        assert_eq!(phases[1].mode, PhaseMode::SequentialRead);
        assert_eq!(phases[2].mode, PhaseMode::RandomWrite);
        assert_eq!(phases[3].mode, PhaseMode::RandomRead);
    }

    #[test]
    fn test_sequential_phases_bounded_single_thread() {
        let runner = BenchmarkRunner::new(config());
        for phase in &runner.phases()[..2] {
            assert_eq!(phase.thread_count, 1);
            assert_eq!(phase.block_size_bytes, SEQUENTIAL_BLOCK_BYTES);
            assert_eq!(phase.total_bytes_bound, Some(10 << 30));
        }
    }

    #[test]
    fn test_random_phases_duration_bounded() {
        let runner = BenchmarkRunner::new(config());
        for phase in &runner.phases()[2..] {
            assert_eq!(phase.thread_count, 128);
            assert_eq!(phase.block_size_bytes, 4096);
            assert_eq!(phase.total_bytes_bound, None);
            assert_eq!(phase.duration, Duration::from_secs(30));
        }
    }

    #[test]
    fn test_device_write_size_bounds_sequential_phases() {
        let mut c = config();
        c.kind = TargetKind::Device;
        c.sequential_bound_bytes = 512 << 20;
        let runner = BenchmarkRunner::new(c);
        let phases = runner.phases();
        assert_eq!(phases[0].total_bytes_bound, Some(512 << 20));
        // Random offsets still span the full configured extent
        assert_eq!(phases[2].target_file_size_bytes, 10 << 30);
    }

    #[test]
    fn test_phase_seeds_distinct() {
        let seeds: Vec<u32> = (0..4).map(|i| phase_seed(42, i)).collect();
        for i in 0..4 {
            for j in i + 1..4 {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
        assert_eq!(phase_seed(42, 0), 42);
    }
}

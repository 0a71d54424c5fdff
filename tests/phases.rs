//! End-to-end phase scenarios against temporary files
//!
//! These drive the coordinator exactly the way the runner does, with short
//! durations and a fast poll tick so the suite stays quick.

use mozzio::config::{PhaseMode, TestPhaseConfig};
use mozzio::coordinator::PhaseCoordinator;
use mozzio::rng::{fill_random_data, RANDOM_DATA_BYTES};
use mozzio::target::{open_target, TargetKind};
use mozzio::BenchError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const BLOCK: u64 = 4096;
const SEED: u32 = 424242;

fn fast_coordinator(threads: usize) -> PhaseCoordinator {
    PhaseCoordinator::new(threads).with_poll_interval(Duration::from_millis(50))
}

fn phase(mode: PhaseMode, target_size: u64, bound: Option<u64>, threads: usize) -> TestPhaseConfig {
    TestPhaseConfig {
        mode,
        block_size_bytes: BLOCK,
        target_file_size_bytes: target_size,
        total_bytes_bound: bound,
        duration: Duration::from_millis(300),
        thread_count: threads,
        startle_delay: Duration::ZERO,
    }
}

fn run(
    coordinator: &mut PhaseCoordinator,
    path: &Path,
    config: &TestPhaseConfig,
    payload: &Arc<Vec<u8>>,
) -> mozzio::Result<mozzio::coordinator::PhaseResult> {
    let file = open_target(path, TargetKind::File, config.mode)?;
    coordinator.run_phase(file, config, payload.clone(), SEED)
}

#[test]
fn sequential_write_then_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.bin");
    let payload = Arc::new(fill_random_data(SEED, RANDOM_DATA_BYTES));
    let bound = 1u64 << 20;

    let mut coordinator = fast_coordinator(1);

    // Bounded sequential write: exact op and byte counts, no partial ops
    let write = phase(PhaseMode::SequentialWrite, bound, Some(bound), 1);
    let result = run(&mut coordinator, &path, &write, &payload).unwrap();
    assert_eq!(result.bytes_done, bound);
    assert_eq!(result.ops_done, bound / BLOCK);
    assert_eq!(result.bytes_done, result.ops_done * BLOCK);

    // On-disk content is re-derivable from the seed alone
    let expected = fill_random_data(SEED, RANDOM_DATA_BYTES);
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written.len() as u64, bound);
    for chunk in written.chunks(BLOCK as usize) {
        assert_eq!(chunk, &expected[..BLOCK as usize]);
    }

    // Sequential read covers the same extent with the same counts
    let read = phase(PhaseMode::SequentialRead, bound, Some(bound), 1);
    let result = run(&mut coordinator, &path, &read, &payload).unwrap();
    assert_eq!(result.bytes_done, bound);
    assert_eq!(result.ops_done, bound / BLOCK);
    assert!(coordinator.states()[0].is_finished());
}

#[test]
fn duration_random_read_stops_on_time_with_all_workers_finished() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.bin");
    let target_size = 256u64 << 10;
    std::fs::write(&path, fill_random_data(SEED, target_size as usize)).unwrap();

    let payload = Arc::new(fill_random_data(SEED, RANDOM_DATA_BYTES));
    let config = phase(PhaseMode::RandomRead, target_size, None, 4);

    let mut coordinator = fast_coordinator(4);
    let result = run(&mut coordinator, &path, &config, &payload).unwrap();

    // Elapsed window is the configured duration plus at most one poll tick
    // and one in-flight operation
    assert!(result.elapsed >= config.duration);
    assert!(result.elapsed < config.duration + Duration::from_secs(2));

    for state in &coordinator.states()[..4] {
        assert!(state.is_finished());
    }
    assert_eq!(result.bytes_done, result.ops_done * BLOCK);
    assert!(result.ops_done > 0);
}

#[test]
fn durable_random_write_stays_within_extent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.bin");
    let target_size = 128u64 << 10;
    std::fs::write(&path, vec![0u8; target_size as usize]).unwrap();

    let payload = Arc::new(fill_random_data(SEED, RANDOM_DATA_BYTES));
    let mut config = phase(PhaseMode::RandomWrite, target_size, None, 2);
    config.duration = Duration::from_millis(200);

    let mut coordinator = fast_coordinator(2);
    let result = run(&mut coordinator, &path, &config, &payload).unwrap();

    // Offsets are always block-aligned and below the extent, so the file
    // never grows past it
    assert_eq!(std::fs::metadata(&path).unwrap().len(), target_size);
    assert_eq!(result.bytes_done, result.ops_done * BLOCK);
    assert!(result.ops_done > 0);
}

#[test]
fn counters_reset_between_phases() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.bin");
    let payload = Arc::new(fill_random_data(SEED, RANDOM_DATA_BYTES));
    let bound = 256u64 << 10;

    let mut coordinator = fast_coordinator(1);
    let write = phase(PhaseMode::SequentialWrite, bound, Some(bound), 1);

    let first = run(&mut coordinator, &path, &write, &payload).unwrap();
    let second = run(&mut coordinator, &path, &write, &payload).unwrap();

    // Reused state records carry nothing across phase boundaries
    assert_eq!(first.bytes_done, second.bytes_done);
    assert_eq!(first.ops_done, second.ops_done);
}

#[test]
fn short_read_is_fatal_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.bin");
    // Half the bound: the read loop hits EOF mid-phase
    std::fs::write(&path, vec![0u8; 128 << 10]).unwrap();

    let payload = Arc::new(fill_random_data(SEED, RANDOM_DATA_BYTES));
    let bound = 256u64 << 10;
    let config = phase(PhaseMode::SequentialRead, bound, Some(bound), 1);

    let mut coordinator = fast_coordinator(1);
    let err = run(&mut coordinator, &path, &config, &payload).unwrap_err();
    assert!(matches!(
        err.downcast::<BenchError>().unwrap(),
        BenchError::ShortIo { op: "read", .. }
    ));
    assert!(coordinator.states()[0].is_finished());
}

#[test]
fn invalid_configuration_rejected_before_any_file_is_created() {
    use clap::Parser;
    use mozzio::config::cli::Cli;
    use mozzio::config::BenchConfig;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-created.bin");

    for bad_block in ["0", "2048", "3"] {
        let cli = Cli::parse_from([
            "mozzio",
            "--path",
            path.to_str().unwrap(),
            "--block-size",
            bad_block,
        ]);
        assert!(BenchConfig::from_cli(&cli).is_err());
        assert!(!path.exists());
    }
}

//! Statistics aggregation and status reporting
//!
//! The aggregator reads (never mutates) the per-thread progress records and
//! sums them into one [`AggregateSnapshot`]. Exact consistency is not
//! required: counters are benignly racy between a worker's byte and op
//! increments, and the sums only ever approach completion monotonically.
//!
//! One status line is rendered per poll tick and rewritten in place with a
//! carriage return; the final line of a phase is tagged `OK` and newline
//! terminated.

use crate::config::TestPhaseConfig;
use crate::util::time::{calculate_iops, calculate_throughput};
use crate::worker::WorkerState;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

const MB: u64 = 1 << 20;

/// Read-only sum of all worker counters at one poll tick
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateSnapshot {
    pub bytes_done: u64,
    pub ops_done: u64,
    /// Earliest worker start, nanoseconds after the phase epoch
    pub earliest_start_nanos: Option<u64>,
    /// Workers that have not yet set their finished flag
    pub unfinished: usize,
}

/// Sum worker counters into an aggregate snapshot
pub fn aggregate(states: &[Arc<WorkerState>]) -> AggregateSnapshot {
    let mut snapshot = AggregateSnapshot::default();

    for state in states {
        snapshot.bytes_done += state.bytes_done();
        snapshot.ops_done += state.ops_done();
        if !state.is_finished() {
            snapshot.unfinished += 1;
        }
        if let Some(start) = state.started_at_nanos() {
            snapshot.earliest_start_nanos = Some(match snapshot.earliest_start_nanos {
                Some(earliest) => earliest.min(start),
                None => start,
            });
        }
    }

    snapshot
}

/// Fraction complete in [0, 1]
///
/// Bounded phases report bytes against the byte bound; duration phases report
/// elapsed time against the run-time budget. Negative elapsed values (the
/// pre-roll countdown) clamp to zero.
pub fn progress_fraction(config: &TestPhaseConfig, bytes_done: u64, elapsed_secs: f64) -> f64 {
    let fraction = match config.total_bytes_bound {
        Some(bound) if bound > 0 => bytes_done as f64 / bound as f64,
        _ => elapsed_secs / config.duration.as_secs_f64(),
    };
    fraction.clamp(0.0, 1.0)
}

/// Column header matching [`format_status`]
pub fn print_status_header() {
    eprintln!(
        "              Thrds Block/kB File/GB Time/sec Done/MB IOPS   Byte rate  Progress"
    );
}

/// Render one status line
///
/// `elapsed_secs` may be negative during the pre-roll countdown; rates are
/// zero-guarded and progress clamps to [0, 100].
pub fn format_status(
    config: &TestPhaseConfig,
    snapshot: &AggregateSnapshot,
    elapsed_secs: f64,
    extra: &str,
) -> String {
    let (iops, byte_rate) = if elapsed_secs > 0.0 {
        let window = Duration::from_secs_f64(elapsed_secs);
        (
            calculate_iops(snapshot.ops_done, window),
            calculate_throughput(snapshot.bytes_done, window),
        )
    } else {
        (0.0, 0.0)
    };
    let progress = progress_fraction(config, snapshot.bytes_done, elapsed_secs);

    format!(
        "{:<5} {:<7} {:<5} {:<8} {:<7} {:<8} {:<7} {:<6} {:<6}MB/s {:5.1}% {}",
        config.mode.pattern_label(),
        config.mode.direction_label(),
        config.thread_count,
        config.block_size_bytes >> 10,
        config.target_file_size_bytes >> 30,
        elapsed_secs as i64,
        snapshot.bytes_done / MB,
        iops as u64,
        byte_rate as u64 / MB,
        progress * 100.0,
        extra,
    )
}

/// Rewrite the current status line in place
pub fn print_status(line: &str) {
    eprint!("\r{line}");
    std::io::stderr().flush().ok();
}

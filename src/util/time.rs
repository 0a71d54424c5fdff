//! Rate calculation helpers
//!
//! Both helpers guard against zero-length windows: a rate over no elapsed
//! time reports as zero rather than dividing by zero, which matters for the
//! very first status line of a phase.

use std::time::Duration;

/// Operations per second over a window
pub fn calculate_iops(operations: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}

/// Bytes per second over a window
pub fn calculate_throughput(bytes: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        bytes as f64 / seconds
    } else {
        0.0
    }
}

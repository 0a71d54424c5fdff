//! Benchmark error taxonomy
//!
//! All fatal errors stop the whole multi-phase run. Workers never abort the
//! process themselves; they return a `BenchError` to the coordinator, which
//! joins every thread before surfacing the first failure.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal benchmark errors
#[derive(Debug, Error)]
pub enum BenchError {
    /// Target cannot be opened or created with the required access mode
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An operation transferred fewer bytes than requested.
    ///
    /// Short transfers are fatal: a retry would corrupt the throughput
    /// measurement, so the run aborts instead.
    #[error("short {op} at offset {offset}: {transferred} of {requested} bytes")]
    ShortIo {
        op: &'static str,
        offset: u64,
        requested: usize,
        transferred: usize,
    },

    /// An operation failed with an OS error
    #[error("{op} failed at offset {offset}: {source}")]
    Io {
        op: &'static str,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Out-of-range configuration, rejected before any phase starts
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

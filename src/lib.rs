//! Mozzio - four-phase disk throughput and IOPS benchmark
//!
//! Mozzio drives a configurable number of worker threads performing sequential
//! or randomly-addressed reads and writes against a file or block device,
//! measuring aggregate bandwidth and operation rate over time.
//!
//! # Architecture
//!
//! - **Fixed phases**: sequential write, sequential read, random write, random read
//! - **Per-thread state**: single-writer atomic counters, read by the poll loop
//! - **Durable random writes**: random write phases run O_SYNC, measuring
//!   synchronous-write latency by design
//! - **Cold-cache reads**: the page cache is dropped before read phases

pub mod config;
pub mod coordinator;
pub mod error;
pub mod rng;
pub mod runner;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::{BenchConfig, PhaseMode, TestPhaseConfig};
pub use error::BenchError;

/// Result type used throughout mozzio
pub type Result<T> = anyhow::Result<T>;

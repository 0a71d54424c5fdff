//! CLI argument parsing using clap

use crate::config::MAX_THREADS;
use clap::Parser;
use std::path::PathBuf;

/// Mozzio - disk throughput and IOPS benchmark
///
/// Runs four fixed phases against one target: sequential write, sequential
/// read, random write (durable), random read.
#[derive(Parser, Debug)]
#[command(name = "mozzio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the benchmark file
    #[arg(short = 'p', long, default_value = "mozzio.bin", conflicts_with = "device")]
    pub path: PathBuf,

    /// Path to a block device to benchmark (never created or truncated)
    #[arg(short = 'd', long)]
    pub device: Option<PathBuf>,

    /// Block size in kB for the random phases (sequential phases always use 128 kB)
    #[arg(short = 'b', long, default_value = "4")]
    pub block_size: u64,

    /// File/device size in GB (extent of the sequential write phase and of
    /// random offset selection)
    #[arg(short = 's', long, default_value = "10")]
    pub size: u64,

    /// Run time in seconds for each duration-bounded (random) phase
    #[arg(short = 'r', long, default_value = "30")]
    pub run_time: u64,

    /// Number of worker threads for the random phases (sequential phases use 1)
    #[arg(short = 't', long, default_value = "128")]
    pub threads: usize,

    /// Sequential write volume in MB (required for device targets, which are
    /// never truncated: only this bounded span is overwritten)
    #[arg(short = 'w', long)]
    pub write_size: Option<u64>,

    /// Seed for the payload buffer and offset streams (default: system entropy)
    #[arg(long)]
    pub seed: Option<u32>,

    /// Enable debug output (per-phase timing, open flags)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    ///
    /// Runs before any file is created or opened; a rejected configuration
    /// leaves the filesystem untouched.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.block_size == 0 || self.block_size > 1024 {
            anyhow::bail!("block size must be between 1 and 1024 kB");
        }
        if !self.block_size.is_power_of_two() {
            anyhow::bail!("block size must be a power of two");
        }

        if self.size == 0 {
            anyhow::bail!("file size must be at least 1 GB");
        }

        if self.run_time == 0 {
            anyhow::bail!("run time must be at least 1 second");
        }

        if self.threads == 0 || self.threads > MAX_THREADS {
            anyhow::bail!("thread count must be between 1 and {}", MAX_THREADS);
        }

        if self.device.is_some() {
            match self.write_size {
                None => anyhow::bail!("device targets require --write-size"),
                Some(0) => anyhow::bail!("write size must be at least 1 MB"),
                Some(_) => {}
            }
        }

        Ok(())
    }
}

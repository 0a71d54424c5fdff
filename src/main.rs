//! Mozzio CLI entry point

use anyhow::Result;
use mozzio::config::cli::Cli;
use mozzio::config::{BenchConfig, SEQUENTIAL_BLOCK_BYTES};
use mozzio::runner::BenchmarkRunner;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;
    let config = BenchConfig::from_cli(&cli)?;

    eprintln!("Starting mozzio v{}.", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "(Numthreads: {}, Runtime: {}s, Filesize: {}G, Blocksize: {}K,{}K, Seed: {})",
        config.thread_count,
        config.run_time.as_secs(),
        config.target_size_bytes >> 30,
        SEQUENTIAL_BLOCK_BYTES >> 10,
        config.block_size_bytes >> 10,
        config.seed,
    );

    let debug = config.debug;
    let run_start = Instant::now();

    let mut runner = BenchmarkRunner::new(config);
    runner.run()?;

    if debug {
        eprintln!(
            "DEBUG TIMING: full run: {:.3}s",
            run_start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

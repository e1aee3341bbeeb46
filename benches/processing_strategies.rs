//! Benchmark suite for comparing processing strategies
//!
//! This benchmark compares the synchronous and asynchronous processing
//! strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Inputs
//!
//! Each run generates a CSV with the requested number of commands spread
//! over 64 users, three charges for every use, so most uses succeed.

use rust_points_engine::cli::{OutputKind, StrategyType};
use rust_points_engine::core::EngineConfig;
use rust_points_engine::strategy::{create_strategy, BatchConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

fn generate_commands(count: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "type,user,amount").expect("Failed to write header");
    for i in 0..count {
        let kind = if i % 4 == 3 { "use" } else { "charge" };
        writeln!(file, "{},{},{}", kind, i % 64, i % 50 + 1).expect("Failed to write row");
    }
    file.flush().expect("Failed to flush temp file");
    file
}

fn run(bencher: divan::Bencher, strategy_type: StrategyType, size: usize) {
    let input = generate_commands(size);
    let batch_config = match strategy_type {
        StrategyType::Sync => None,
        StrategyType::Async => Some(BatchConfig::default()),
    };
    let strategy = create_strategy(
        strategy_type,
        EngineConfig::default(),
        batch_config,
        OutputKind::Balances,
    );

    bencher.bench(|| {
        let mut output = Vec::new();
        strategy
            .process(input.path(), &mut output)
            .expect("Processing failed");
        output
    });
}

#[divan::bench(args = [100, 1_000, 100_000])]
fn sync_strategy(bencher: divan::Bencher, size: usize) {
    run(bencher, StrategyType::Sync, size);
}

#[divan::bench(args = [100, 1_000, 100_000])]
fn async_strategy(bencher: divan::Bencher, size: usize) {
    run(bencher, StrategyType::Async, size);
}

//! Rust Points Engine CLI
//!
//! Command-line interface for applying point charge and use commands from
//! CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > balances.csv
//! cargo run -- --strategy sync commands.csv > balances.csv
//! cargo run -- --output history commands.csv > history.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > balances.csv
//! RUST_LOG=debug cargo run -- --lock-timeout-ms 1000 commands.csv
//! ```
//!
//! CSV goes to stdout; logs go to stderr and are filtered with `RUST_LOG`
//! (default `warn`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output not writable, etc.)

use rust_points_engine::cli;
use rust_points_engine::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let strategy = {
        let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(
            args.strategy,
            args.to_engine_config(),
            batch_config,
            args.output,
        )
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "processing failed");
        process::exit(1);
    }
}

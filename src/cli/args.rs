use crate::core::EngineConfig;
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Apply point charge and use commands and report balances or history
#[derive(Parser, Debug)]
#[command(name = "points-engine")]
#[command(about = "Apply point charge/use commands from a CSV file", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing `type,user,amount` rows
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for in-order single-threaded or 'async' for concurrent batches"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads processing users concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Per-user lock wait bound in milliseconds
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        help = "Maximum time a command waits for its user's lock (default: 5000)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// What to write to stdout
    #[arg(
        long = "output",
        value_name = "OUTPUT",
        default_value = "balances",
        help = "Output: 'balances' for final balances or 'history' for every committed record"
    )]
    pub output: OutputKind,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Available output reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    Balances,
    History,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, defaulting what is not given
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create an EngineConfig from CLI arguments
    pub fn to_engine_config(&self) -> EngineConfig {
        match self.lock_timeout_ms {
            Some(millis) => EngineConfig::from_millis(millis),
            None => EngineConfig::default(),
        }
    }
}

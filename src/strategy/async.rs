//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Commands are read in batches and each batch is
//! partitioned by user, so different users are processed in parallel.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (user partitioning + tokio tasks)
//!     └── PointEngine (per-user locks)
//!         ├── InMemoryBalanceStore
//!         └── InMemoryHistoryLog
//! ```
//!
//! # Ordering
//!
//! Batches run one after another, and within a batch a user's commands run
//! sequentially on one task. A user's commands are therefore applied in file
//! order even when they span batches, and the final balances match the
//! synchronous strategy. History ids may interleave differently across users.

use crate::cli::OutputKind;
use crate::core::{BatchProcessor, EngineConfig};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{finish, in_memory_engine, ProcessingStrategy, RunStats};
use crate::types::PointError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "Invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches (0), using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    engine_config: EngineConfig,
    output_kind: OutputKind,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, engine_config: EngineConfig, output_kind: OutputKind) -> Self {
        Self {
            config,
            engine_config,
            output_kind,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), PointError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .enable_time()
            .build()
            .map_err(|e| PointError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

        runtime.block_on(async {
            let (engine, balances, history) = in_memory_engine(self.engine_config.clone());
            let processor = BatchProcessor::new(engine.clone());

            let file = tokio::fs::File::open(input_path).await.map_err(|e| {
                PointError::io_error(format!(
                    "Failed to open file '{}': {}",
                    input_path.display(),
                    e
                ))
            })?;

            // csv-async reads through the futures-io traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut stats = RunStats::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Wait for the whole batch so a user's later commands cannot overtake it
                let results = processor.process_batch(batch).await;
                debug!(commands = results.len(), "batch processed");

                for processed in results {
                    match processed.result {
                        Ok(_) => stats.committed += 1,
                        Err(e) => {
                            stats.rejected += 1;
                            warn!(
                                user_id = processed.command.user_id,
                                kind = processed.command.kind.as_str(),
                                amount = processed.command.amount,
                                error = %e,
                                "command rejected"
                            );
                        }
                    }
                }
            }

            finish(&engine, &balances, &history, stats, self.output_kind, output).await
        })
    }
}

//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. Commands are streamed from `SyncReader` and
//! executed one at a time in file order on a current-thread tokio runtime,
//! so the result is fully determined by the input.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Point mutations to `PointEngine`
//! - CSV output to the `csv_format` writers

use crate::cli::OutputKind;
use crate::core::EngineConfig;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{finish, in_memory_engine, ProcessingStrategy, RunStats};
use crate::types::PointError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use rust_points_engine::cli::OutputKind;
/// use rust_points_engine::core::EngineConfig;
/// use rust_points_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(EngineConfig::default(), OutputKind::Balances);
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("commands.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    engine_config: EngineConfig,
    output_kind: OutputKind,
}

impl SyncProcessingStrategy {
    pub fn new(engine_config: EngineConfig, output_kind: OutputKind) -> Self {
        Self {
            engine_config,
            output_kind,
        }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), PointError> {
        let reader = SyncReader::new(input_path)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| PointError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

        runtime.block_on(async {
            let (engine, balances, history) = in_memory_engine(self.engine_config.clone());
            let mut stats = RunStats::default();

            for result in reader {
                match result {
                    Ok(command) => match engine.execute(command).await {
                        Ok(_) => stats.committed += 1,
                        Err(e) => {
                            stats.rejected += 1;
                            warn!(
                                user_id = command.user_id,
                                kind = command.kind.as_str(),
                                amount = command.amount,
                                error = %e,
                                "command rejected"
                            );
                        }
                    },
                    Err(e) => {
                        stats.rejected += 1;
                        warn!(error = %e, "skipping record");
                    }
                }
            }

            finish(&engine, &balances, &history, stats, self.output_kind, output).await
        })
    }
}

//! Processing strategy module for point command files
//!
//! This module defines the Strategy pattern for complete processing
//! pipelines, from CSV parsing through the point engine to CSV output, so
//! that the synchronous and the concurrent batch implementation can be
//! selected at runtime.

use crate::cli::{OutputKind, StrategyType};
use crate::core::{EngineConfig, InMemoryBalanceStore, InMemoryHistoryLog, InMemoryPointEngine};
use crate::io::{write_balances_csv, write_history_csv};
use crate::types::PointError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Process commands from the input file and write the result to output
    ///
    /// Rejected commands and malformed rows are logged and skipped; they do
    /// not fail the run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - The runtime cannot be created
    /// - Output cannot be written
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), PointError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `batch_config` is ignored by the sync strategy and defaults when absent.
pub fn create_strategy(
    strategy_type: StrategyType,
    engine_config: EngineConfig,
    batch_config: Option<BatchConfig>,
    output_kind: OutputKind,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine_config, output_kind)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            batch_config.unwrap_or_default(),
            engine_config,
            output_kind,
        )),
    }
}

/// Fresh engine over empty in-memory collaborators
pub(crate) fn in_memory_engine(
    config: EngineConfig,
) -> (
    InMemoryPointEngine,
    Arc<InMemoryBalanceStore>,
    Arc<InMemoryHistoryLog>,
) {
    let balances = Arc::new(InMemoryBalanceStore::new());
    let history = Arc::new(InMemoryHistoryLog::new());
    let engine = InMemoryPointEngine::new(Arc::clone(&balances), Arc::clone(&history), config);
    (engine, balances, history)
}

/// Running totals of a processing run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunStats {
    pub committed: usize,
    pub rejected: usize,
}

/// Verify every stored user, log the run, then write the requested output
pub(crate) async fn finish(
    engine: &InMemoryPointEngine,
    balances: &InMemoryBalanceStore,
    history: &InMemoryHistoryLog,
    stats: RunStats,
    output_kind: OutputKind,
    output: &mut dyn Write,
) -> Result<(), PointError> {
    let snapshot = balances.snapshot();

    let mut mismatched = 0;
    for balance in &snapshot {
        if let Err(e) = engine.verify(balance.user_id).await {
            error!(user_id = balance.user_id, error = %e, "history does not replay to balance");
            mismatched += 1;
        }
    }

    info!(
        committed = stats.committed,
        rejected = stats.rejected,
        users = snapshot.len(),
        mismatched,
        "processing complete"
    );

    match output_kind {
        OutputKind::Balances => write_balances_csv(&snapshot, output),
        OutputKind::History => write_history_csv(&history.snapshot(), output),
    }
}

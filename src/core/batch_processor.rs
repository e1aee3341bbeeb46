//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! point commands concurrently across users while keeping each user's
//! commands in input order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── PointEngine  (shared; per-user locks live inside)
//! ```
//!
//! Partitioning keeps a user's commands on a single task, so they reach the
//! engine in input order and never queue behind each other on the user's
//! lock. The engine's locks still guard against any other caller touching
//! the same users.

use std::collections::HashMap;

use tracing::error;

use crate::core::engine::PointEngine;
use crate::core::traits::{BalanceStore, HistoryLog};
use crate::types::{PointCommand, PointError, UserId, UserPoint};

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub command: PointCommand,

    /// The balance after the command, or why it was rejected
    pub result: Result<UserPoint, PointError>,
}

/// Batch processor with user-based partitioning
#[derive(Debug)]
pub struct BatchProcessor<B, H> {
    engine: PointEngine<B, H>,
}

impl<B, H> Clone for BatchProcessor<B, H> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<B, H> BatchProcessor<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryLog + 'static,
{
    pub fn new(engine: PointEngine<B, H>) -> Self {
        Self { engine }
    }

    /// Partition a batch into per-user sub-batches
    ///
    /// Every command lands in exactly one sub-batch, and each sub-batch keeps
    /// the original relative order of its commands.
    pub fn partition_by_user(
        &self,
        batch: Vec<PointCommand>,
    ) -> HashMap<UserId, Vec<PointCommand>> {
        let mut user_batches: HashMap<UserId, Vec<PointCommand>> = HashMap::new();

        for command in batch {
            user_batches
                .entry(command.user_id)
                .or_default()
                .push(command);
        }

        user_batches
    }

    /// Process one user's commands sequentially
    ///
    /// A failed command is recorded in its result and does not stop the rest.
    pub async fn process_user_commands(
        &self,
        commands: Vec<PointCommand>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.engine.execute(command).await;
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Process a batch with one tokio task per user
    ///
    /// Results of different users may be interleaved in any order; results
    /// of one user are in input order.
    pub async fn process_batch(&self, batch: Vec<PointCommand>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user_id, commands) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => {
                    error!(error = %e, "batch task panicked");
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::balance_store::InMemoryBalanceStore;
    use crate::core::config::EngineConfig;
    use crate::core::history_log::InMemoryHistoryLog;
    use crate::types::TransactionKind;
    use std::sync::Arc;

    type Processor = BatchProcessor<InMemoryBalanceStore, InMemoryHistoryLog>;

    fn processor() -> (Processor, PointEngine<InMemoryBalanceStore, InMemoryHistoryLog>) {
        let engine = PointEngine::new(
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryHistoryLog::new()),
            EngineConfig::default(),
        );
        (BatchProcessor::new(engine.clone()), engine)
    }

    fn charge(user_id: UserId, amount: i64) -> PointCommand {
        PointCommand {
            kind: TransactionKind::Charge,
            user_id,
            amount,
        }
    }

    fn use_points(user_id: UserId, amount: i64) -> PointCommand {
        PointCommand {
            kind: TransactionKind::Use,
            user_id,
            amount,
        }
    }

    #[test]
    fn test_partition_by_user_empty_batch() {
        let (processor, _) = processor();
        assert!(processor.partition_by_user(vec![]).is_empty());
    }

    #[test]
    fn test_partition_by_user_maintains_order() {
        let (processor, _) = processor();

        let batch = vec![
            charge(1, 10),
            charge(2, 20),
            use_points(1, 5),
            charge(2, 30),
            charge(1, 7),
        ];

        let partitioned = processor.partition_by_user(batch);

        assert_eq!(partitioned.len(), 2);
        assert_eq!(
            partitioned[&1],
            vec![charge(1, 10), use_points(1, 5), charge(1, 7)]
        );
        assert_eq!(partitioned[&2], vec![charge(2, 20), charge(2, 30)]);
    }

    #[test]
    fn test_partition_by_user_no_commands_lost() {
        let (processor, _) = processor();

        let batch: Vec<_> = (0..100).map(|i| charge(i % 7, i + 1)).collect();
        let partitioned = processor.partition_by_user(batch);

        let total: usize = partitioned.values().map(Vec::len).sum();
        assert_eq!(total, 100);
        assert_eq!(partitioned.len(), 7);
        assert!(partitioned
            .iter()
            .all(|(user_id, commands)| commands.iter().all(|c| c.user_id == *user_id)));
    }

    #[tokio::test]
    async fn test_process_user_commands_continues_after_error() {
        let (processor, engine) = processor();

        let results = processor
            .process_user_commands(vec![charge(1, 100), use_points(1, 500), use_points(1, 40)])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].result.as_ref().unwrap().point, 100);
        assert_eq!(
            results[1].result.as_ref().unwrap_err(),
            &PointError::insufficient_balance(1, 100, 500)
        );
        assert_eq!(results[2].result.as_ref().unwrap().point, 60);
        assert_eq!(engine.get_balance(1).await.point, 60);
    }

    #[tokio::test]
    async fn test_process_batch_empty() {
        let (processor, _) = processor();
        assert!(processor.process_batch(vec![]).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_interleaved_users() {
        let (processor, engine) = processor();

        let batch = vec![
            charge(1, 100),
            charge(2, 50),
            use_points(1, 30),
            use_points(2, 60),
            charge(3, 5),
            charge(2, 20),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 6);
        let failures: Vec<_> = results.iter().filter(|r| r.result.is_err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].command, use_points(2, 60));

        assert_eq!(engine.get_balance(1).await.point, 70);
        assert_eq!(engine.get_balance(2).await.point, 70);
        assert_eq!(engine.get_balance(3).await.point, 5);
        for user_id in 1..=3 {
            assert!(engine.verify(user_id).await.is_ok());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_keeps_per_user_results_in_order() {
        let (processor, _) = processor();

        let batch: Vec<_> = (1..=50).map(|i| charge(i % 5, i)).collect();
        let results = processor.process_batch(batch).await;

        for user_id in 0..5 {
            let amounts: Vec<i64> = results
                .iter()
                .filter(|r| r.command.user_id == user_id)
                .map(|r| r.command.amount)
                .collect();
            let mut sorted = amounts.clone();
            sorted.sort();
            assert_eq!(amounts, sorted);
            assert_eq!(amounts.len(), 10);
        }
    }
}

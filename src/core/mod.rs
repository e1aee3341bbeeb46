//! Core business logic module
//!
//! This module contains the point processing components:
//! - `traits` - Storage collaborator contracts
//! - `balance_store` - In-memory current balances
//! - `history_log` - In-memory append-only history
//! - `lock_registry` - Per-user exclusion
//! - `committed_view` - Last committed state per user, read by queries
//! - `config` - Engine configuration
//! - `engine` - Charge/use orchestration
//! - `batch_processor` - Concurrent batch execution partitioned by user

pub mod balance_store;
pub mod batch_processor;
pub mod committed_view;
pub mod config;
pub mod engine;
pub mod history_log;
pub mod lock_registry;
pub mod traits;

pub use balance_store::InMemoryBalanceStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use committed_view::{CommittedViews, UserView};
pub use config::{EngineConfig, DEFAULT_LOCK_TIMEOUT};
pub use engine::PointEngine;
pub use history_log::InMemoryHistoryLog;
pub use lock_registry::{UserLease, UserLockRegistry};
pub use traits::{BalanceStore, HistoryLog};

/// Engine over the in-memory collaborators
pub type InMemoryPointEngine = PointEngine<InMemoryBalanceStore, InMemoryHistoryLog>;

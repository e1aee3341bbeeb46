//! Rust Points Engine Library
//! # Overview
//!
//! This library keeps a point balance per user, applies charge and use
//! requests against it, and records every committed mutation in an
//! append-only history. Mutations of one user are serialized; different users
//! proceed in parallel.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (UserPoint, PointHistory, PointError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Charge/use orchestration over the collaborators
//!   - [`core::lock_registry`] - Per-user exclusion with bounded waits
//!   - [`core::committed_view`] - Last committed state, read by queries
//!   - [`core::balance_store`] / [`core::history_log`] - In-memory collaborators
//!   - [`core::batch_processor`] - Concurrent execution partitioned by user
//! - [`io`] - CSV input and output
//! - [`strategy`] - Sync and async processing pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **Charge**: Credit a positive amount to a user
//! - **Use**: Debit a positive amount, bounded by the current balance
//! - **Balance / History**: Read a user's state, zero and empty if unknown
//!
//! # Invariants
//!
//! - A balance is never negative
//! - Replaying a user's history as signed deltas from zero yields the balance
//! - A rejected request leaves balance and history unchanged

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    BalanceStore, EngineConfig, HistoryLog, InMemoryBalanceStore, InMemoryHistoryLog,
    InMemoryPointEngine, PointEngine, UserLockRegistry,
};
pub use io::{write_balances_csv, write_history_csv};
pub use types::{
    replay_balance, Point, PointCommand, PointError, PointHistory, StoreError, TransactionKind,
    UserId, UserPoint,
};

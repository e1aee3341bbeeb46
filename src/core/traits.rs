//! Core traits for the engine's storage collaborators
//!
//! This module defines the trait abstractions for the balance store and the
//! history log, so the engine can run against the in-memory implementations
//! or any other backing that honors the same contract.

use crate::types::{Point, PointHistory, StoreError, TransactionKind, UserId, UserPoint};
use chrono::{DateTime, Utc};

/// Key-value store of current balances
///
/// Each call must be atomic on its own. The engine provides per-user
/// serialization, so implementations need no locking beyond that.
pub trait BalanceStore: Send + Sync {
    /// Read the stored balance for a user, `None` if never written
    fn read(&self, user_id: UserId) -> Option<UserPoint>;

    /// Store a new balance for a user and return it as persisted
    fn write(&self, user_id: UserId, point: Point) -> Result<UserPoint, StoreError>;
}

/// Append-only log of committed mutations
pub trait HistoryLog: Send + Sync {
    /// Append a record and return it with its assigned id
    fn append(
        &self,
        user_id: UserId,
        amount: Point,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Result<PointHistory, StoreError>;

    /// All records for a user in insertion order
    fn list_by_user(&self, user_id: UserId) -> Vec<PointHistory>;
}

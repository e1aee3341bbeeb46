//! Thread-safe in-memory history log
//!
//! This module provides the `InMemoryHistoryLog` struct, which keeps every
//! committed charge and use, grouped by user, in insertion order.
//!
//! # Ids
//!
//! Record ids come from a single atomic sequence starting at 1, so they are
//! unique across users and increase with insertion order. Appends for one
//! user are serialized by the engine, so a user's records are also ordered
//! by id.

use crate::core::traits::HistoryLog;
use crate::types::{HistoryId, Point, PointHistory, StoreError, TransactionKind, UserId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory append-only history log backed by `DashMap`
#[derive(Debug)]
pub struct InMemoryHistoryLog {
    /// Records by user id, in insertion order
    records: DashMap<UserId, Vec<PointHistory>>,

    /// Next id to hand out
    next_id: AtomicU64,
}

impl InMemoryHistoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// All records across users sorted by id
    pub fn snapshot(&self) -> Vec<PointHistory> {
        let mut records: Vec<PointHistory> = self
            .records
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Number of records appended so far
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_id(&self) -> HistoryId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryHistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(
        &self,
        user_id: UserId,
        amount: Point,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Result<PointHistory, StoreError> {
        let mut entry = self.records.entry(user_id).or_insert_with(Vec::new);
        let record = PointHistory {
            id: self.next_id(),
            user_id,
            amount,
            kind,
            timestamp,
        };
        entry.value_mut().push(record.clone());
        Ok(record)
    }

    fn list_by_user(&self, user_id: UserId) -> Vec<PointHistory> {
        self.records
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

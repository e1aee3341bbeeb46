//! Thread-safe in-memory balance store
//!
//! This module provides the `InMemoryBalanceStore` struct, which keeps the
//! current balance of every user in a `DashMap` keyed by user id.
//!
//! # Thread Safety
//!
//! DashMap shards its entries, so reads and writes for different users do
//! not contend. Each `read` or `write` call is atomic for its entry.

use crate::core::traits::BalanceStore;
use crate::types::{Point, StoreError, UserId, UserPoint};
use dashmap::DashMap;

/// In-memory balance store backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    /// Current balances by user id
    balances: DashMap<UserId, UserPoint>,
}

impl InMemoryBalanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Create a store pre-populated with `(user_id, point)` pairs
    ///
    /// Seeded balances carry no history. Used to load state that predates
    /// this engine.
    pub fn with_balances(balances: impl IntoIterator<Item = (UserId, Point)>) -> Self {
        let store = Self::new();
        for (user_id, point) in balances {
            store.balances.insert(user_id, UserPoint::new(user_id, point));
        }
        store
    }

    /// All stored balances sorted by user id
    ///
    /// The result is a snapshot; concurrent writes after this call are not
    /// reflected.
    pub fn snapshot(&self) -> Vec<UserPoint> {
        let mut balances: Vec<UserPoint> =
            self.balances.iter().map(|entry| *entry.value()).collect();
        balances.sort_by_key(|balance| balance.user_id);
        balances
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn read(&self, user_id: UserId) -> Option<UserPoint> {
        self.balances.get(&user_id).map(|entry| *entry.value())
    }

    fn write(&self, user_id: UserId, point: Point) -> Result<UserPoint, StoreError> {
        let balance = UserPoint::new(user_id, point);
        self.balances.insert(user_id, balance);
        Ok(balance)
    }
}

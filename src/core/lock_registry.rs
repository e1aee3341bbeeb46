//! Per-user exclusion for balance mutations
//!
//! This module provides the `UserLockRegistry`, which hands out leases on a
//! per-user lock so that at most one charge or use runs its
//! read-modify-write-append sequence for a given user at any time, while
//! different users proceed in parallel.
//!
//! # Design
//!
//! ```text
//! UserLockRegistry
//!     └── Arc<DashMap<UserId, Arc<RwLock<()>>>>
//!             ├── write lease  (charge / use)
//!             └── read lease   (verify)
//! ```
//!
//! Slots are created on first use and removed as soon as no lease or waiter
//! references them, so the key space is unbounded without growing forever.
//! tokio's `RwLock` queues waiters in arrival order, which keeps mutations
//! for the same user FIFO and prevents writer starvation.
//!
//! # Reclamation
//!
//! A slot is referenced by the map plus one `Arc` per lease or pending
//! waiter. Removal happens under DashMap's shard lock and only when the
//! map holds the sole reference, so nobody can be holding or waiting on a
//! slot that gets removed. Every acquisition attempts removal when it ends,
//! whether it succeeded, timed out or was cancelled mid-wait, and every
//! lease does when it drops.

use crate::types::{PointError, UserId};
use dashmap::DashMap;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{trace, warn};

type Slot = Arc<RwLock<()>>;

/// Registry of per-user locks
///
/// Cheap to clone; clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct UserLockRegistry {
    slots: Arc<DashMap<UserId, Slot>>,
}

impl UserLockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }

    /// Acquire exclusive access to a user, waiting at most `wait`
    ///
    /// # Errors
    ///
    /// Returns `PointError::Timeout` if the lease is not granted in time.
    /// The caller's place in the queue is given up.
    pub async fn acquire_exclusive(
        &self,
        user_id: UserId,
        wait: Duration,
    ) -> Result<UserLease, PointError> {
        let _pending = PendingAcquire::new(&self.slots, user_id);
        let waiting = pin!(tokio::time::timeout(wait, self.slot(user_id).write_owned()));

        match waiting.await {
            Ok(guard) => {
                trace!(user_id, "acquired exclusive lease");
                Ok(self.lease(user_id, LeaseGuard::Exclusive(guard)))
            }
            Err(_) => {
                let waited_ms = wait.as_millis() as u64;
                warn!(user_id, waited_ms, "timed out waiting for user lock");
                Err(PointError::timeout(user_id, waited_ms))
            }
        }
    }

    /// Acquire shared access to a user, waiting at most `wait`
    ///
    /// Shared leases coexist with each other and wait only for an in-flight
    /// or already queued mutation of the same user.
    ///
    /// # Errors
    ///
    /// Returns `PointError::Timeout` if the lease is not granted in time.
    pub async fn acquire_shared(
        &self,
        user_id: UserId,
        wait: Duration,
    ) -> Result<UserLease, PointError> {
        let _pending = PendingAcquire::new(&self.slots, user_id);
        let waiting = pin!(tokio::time::timeout(wait, self.slot(user_id).read_owned()));

        match waiting.await {
            Ok(guard) => {
                trace!(user_id, "acquired shared lease");
                Ok(self.lease(user_id, LeaseGuard::Shared(guard)))
            }
            Err(_) => {
                let waited_ms = wait.as_millis() as u64;
                warn!(user_id, waited_ms, "timed out waiting for shared user lock");
                Err(PointError::timeout(user_id, waited_ms))
            }
        }
    }

    /// Number of users with a live slot
    pub fn active_users(&self) -> usize {
        self.slots.len()
    }

    /// Drop every slot nobody holds or waits on
    pub fn purge_idle(&self) {
        self.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
    }

    fn lease(&self, user_id: UserId, guard: LeaseGuard) -> UserLease {
        UserLease {
            user_id,
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
        }
    }

    fn slot(&self, user_id: UserId) -> Slot {
        self.slots
            .entry(user_id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .value()
            .clone()
    }
}

fn reclaim(slots: &DashMap<UserId, Slot>, user_id: UserId) {
    slots.remove_if(&user_id, |_, slot| Arc::strong_count(slot) == 1);
}

/// Reclaims the slot when an acquisition ends
///
/// Declared before the pinned wait, so a cancelled wait drops its `Arc` to
/// the slot before this runs.
struct PendingAcquire<'a> {
    slots: &'a DashMap<UserId, Slot>,
    user_id: UserId,
}

impl<'a> PendingAcquire<'a> {
    fn new(slots: &'a DashMap<UserId, Slot>, user_id: UserId) -> Self {
        Self { slots, user_id }
    }
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        reclaim(self.slots, self.user_id);
    }
}

#[derive(Debug)]
enum LeaseGuard {
    Exclusive(#[allow(dead_code)] OwnedRwLockWriteGuard<()>),
    Shared(#[allow(dead_code)] OwnedRwLockReadGuard<()>),
}

/// Held access to one user's slot, released on drop
#[derive(Debug)]
pub struct UserLease {
    user_id: UserId,
    guard: Option<LeaseGuard>,
    slots: Arc<DashMap<UserId, Slot>>,
}

impl UserLease {
    /// The user this lease covers
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Whether this lease excludes every other lease on the user
    pub fn is_exclusive(&self) -> bool {
        matches!(self.guard, Some(LeaseGuard::Exclusive(_)))
    }
}

impl Drop for UserLease {
    fn drop(&mut self) {
        // The guard owns an Arc to the slot; release it before the count check.
        self.guard.take();
        reclaim(&self.slots, self.user_id);
    }
}

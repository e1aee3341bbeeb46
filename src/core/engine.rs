//! Point balance engine
//!
//! This module provides the `PointEngine`, which validates charge and use
//! requests and runs each one as a single logical transaction against a
//! `BalanceStore` and a `HistoryLog`.
//!
//! # Architecture
//!
//! ```text
//! PointEngine
//!     ├── Arc<B: BalanceStore>   (current balance per user)
//!     ├── Arc<H: HistoryLog>     (append-only history per user)
//!     ├── UserLockRegistry       (per-user exclusion)
//!     └── CommittedViews         (last committed state, read by queries)
//! ```
//!
//! # Mutation sequence
//!
//! 1. Reject non-positive amounts (`InvalidAmount`) before touching anything
//! 2. Take the user's exclusive lease (bounded by `EngineConfig::lock_timeout`)
//! 3. Read the balance (absent means 0), check sufficiency for use
//! 4. Write the new balance, then append the history record
//! 5. Compare what the collaborators returned against what was requested
//! 6. Publish the new committed view
//!
//! A failed or mismatched append after a successful write triggers a
//! compensating write of the previous balance. Either way the caller gets
//! `PersistenceFailure`; success is only reported once both the write and
//! the append are in place.
//!
//! `get_balance` and `get_history` read the committed view and never wait on
//! a user's lock. `verify` inspects the collaborators themselves under a
//! shared lease bounded by `EngineConfig::lock_timeout`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::core::committed_view::{CommittedViews, UserView};
use crate::core::config::EngineConfig;
use crate::core::lock_registry::UserLockRegistry;
use crate::core::traits::{BalanceStore, HistoryLog};
use crate::types::{
    replay_balance, Point, PointCommand, PointError, PointHistory, StoreError, TransactionKind,
    UserId, UserPoint,
};

/// Balance mutation engine
///
/// Cloning is cheap and clones share collaborators and locks, so one engine
/// can be handed to many tasks.
#[derive(Debug)]
pub struct PointEngine<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
    locks: UserLockRegistry,
    views: CommittedViews,
    config: EngineConfig,
}

impl<B, H> Clone for PointEngine<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
            locks: self.locks.clone(),
            views: self.views.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B: BalanceStore, H: HistoryLog> PointEngine<B, H> {
    /// Create a new PointEngine over the given collaborators
    pub fn new(balances: Arc<B>, history: Arc<H>, config: EngineConfig) -> Self {
        Self {
            balances,
            history,
            locks: UserLockRegistry::new(),
            views: CommittedViews::new(),
            config,
        }
    }

    /// The per-user lock registry used by this engine
    pub fn lock_registry(&self) -> &UserLockRegistry {
        &self.locks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Committed balance of a user, zero if the user is unknown
    ///
    /// Does not wait for an in-flight mutation of the user.
    pub async fn get_balance(&self, user_id: UserId) -> UserPoint {
        self.committed(user_id).balance
    }

    /// Committed history records of a user in insertion order
    ///
    /// Records appended by a mutation that has not committed are left out.
    pub async fn get_history(&self, user_id: UserId) -> Vec<PointHistory> {
        self.committed(user_id)
            .visible_history(self.history.list_by_user(user_id))
    }

    /// Credit `amount` points to a user
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `Timeout` if the user's lock is not granted in time
    /// - `ArithmeticOverflow` if the new balance is not representable
    /// - `PersistenceFailure` if a collaborator fails or disagrees
    pub async fn charge(&self, user_id: UserId, amount: Point) -> Result<UserPoint, PointError> {
        validate_amount(user_id, amount)?;

        let _lease = self
            .locks
            .acquire_exclusive(user_id, self.config.lock_timeout)
            .await?;

        let current = self.current(user_id);
        let new_point = current
            .point
            .checked_add(amount)
            .ok_or_else(|| PointError::arithmetic_overflow("charge", user_id))?;

        self.commit(current, new_point, amount, TransactionKind::Charge)
    }

    /// Debit `amount` points from a user
    ///
    /// The amount is checked before the balance, so a non-positive request
    /// reports `InvalidAmount` whatever the balance is.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `Timeout` if the user's lock is not granted in time
    /// - `InsufficientBalance` if `amount` exceeds the current balance
    /// - `PersistenceFailure` if a collaborator fails or disagrees
    pub async fn use_points(
        &self,
        user_id: UserId,
        amount: Point,
    ) -> Result<UserPoint, PointError> {
        validate_amount(user_id, amount)?;

        let _lease = self
            .locks
            .acquire_exclusive(user_id, self.config.lock_timeout)
            .await?;

        let current = self.current(user_id);
        if current.point < amount {
            return Err(PointError::insufficient_balance(
                user_id,
                current.point,
                amount,
            ));
        }

        let new_point = current
            .point
            .checked_sub(amount)
            .ok_or_else(|| PointError::arithmetic_overflow("use", user_id))?;

        self.commit(current, new_point, amount, TransactionKind::Use)
    }

    /// Route a command to `charge` or `use_points`
    pub async fn execute(&self, command: PointCommand) -> Result<UserPoint, PointError> {
        match command.kind {
            TransactionKind::Charge => self.charge(command.user_id, command.amount).await,
            TransactionKind::Use => self.use_points(command.user_id, command.amount).await,
        }
    }

    /// Check that replaying a user's history reproduces their balance
    ///
    /// Balance and history are read from the collaborators under one shared
    /// lease, so a balance left behind by a failed rollback is caught.
    ///
    /// # Errors
    ///
    /// - `HistoryMismatch` if the replayed sum differs from the stored
    ///   balance. Balances seeded into the store without history will differ.
    /// - `Timeout` if the user's lock is not granted in time
    pub async fn verify(&self, user_id: UserId) -> Result<UserPoint, PointError> {
        let _lease = self
            .locks
            .acquire_shared(user_id, self.config.lock_timeout)
            .await?;

        let balance = self.current(user_id);
        let replayed = replay_balance(&self.history.list_by_user(user_id));

        if replayed != Some(balance.point) {
            return Err(PointError::history_mismatch(
                user_id,
                balance.point,
                replayed,
            ));
        }

        Ok(balance)
    }

    fn current(&self, user_id: UserId) -> UserPoint {
        self.balances
            .read(user_id)
            .unwrap_or_else(|| UserPoint::empty(user_id))
    }

    fn committed(&self, user_id: UserId) -> UserView {
        self.views.read(user_id, || self.load_view(user_id))
    }

    fn load_view(&self, user_id: UserId) -> UserView {
        UserView::from_parts(self.current(user_id), &self.history.list_by_user(user_id))
    }

    /// Write the new balance and append its history record
    ///
    /// Must be called while holding the user's exclusive lease.
    fn commit(
        &self,
        current: UserPoint,
        new_point: Point,
        amount: Point,
        kind: TransactionKind,
    ) -> Result<UserPoint, PointError> {
        let user_id = current.user_id;
        let operation = kind.as_str();
        let timestamp = Utc::now();

        self.views.pin(user_id, || {
            UserView::from_parts(current, &self.history.list_by_user(user_id))
        });

        let updated = self.balances.write(user_id, new_point).map_err(|e| {
            warn!(user_id, operation, error = %e, "balance write failed");
            PointError::persistence_failure(user_id, operation, format!("balance write failed: {e}"))
        })?;

        if updated.user_id != user_id || updated.point != new_point {
            error!(
                user_id,
                operation,
                expected = new_point,
                actual = updated.point,
                "balance store returned unexpected state"
            );
            let rollback = self.roll_back(user_id, current.point);
            return Err(PointError::persistence_failure(
                user_id,
                operation,
                format!(
                    "balance store returned {} for user {} after writing {}; {}",
                    updated.point,
                    updated.user_id,
                    new_point,
                    describe_rollback(&rollback)
                ),
            ));
        }

        match self.history.append(user_id, amount, kind, timestamp) {
            Ok(record)
                if record.user_id == user_id && record.amount == amount && record.kind == kind =>
            {
                debug!(
                    user_id,
                    operation,
                    amount,
                    balance = updated.point,
                    history_id = record.id,
                    "committed"
                );
                self.views.publish(
                    user_id,
                    UserView {
                        balance: updated,
                        last_history_id: Some(record.id),
                    },
                );
                Ok(updated)
            }
            Ok(record) => {
                error!(
                    user_id,
                    operation,
                    amount,
                    history_id = record.id,
                    recorded_user = record.user_id,
                    recorded_amount = record.amount,
                    recorded_kind = record.kind.as_str(),
                    "history log recorded a different entry"
                );
                let rollback = self.roll_back(user_id, current.point);
                Err(PointError::persistence_failure(
                    user_id,
                    operation,
                    format!(
                        "history log recorded {} {} for user {} as entry {}; {}",
                        record.kind.as_str(),
                        record.amount,
                        record.user_id,
                        record.id,
                        describe_rollback(&rollback)
                    ),
                ))
            }
            Err(e) => {
                warn!(user_id, operation, error = %e, "history append failed");
                let rollback = self.roll_back(user_id, current.point);
                Err(PointError::persistence_failure(
                    user_id,
                    operation,
                    format!("history append failed: {e}; {}", describe_rollback(&rollback)),
                ))
            }
        }
    }

    /// Compensating write of the balance held before the failed mutation
    fn roll_back(&self, user_id: UserId, previous: Point) -> Result<(), StoreError> {
        match self.balances.write(user_id, previous) {
            Ok(_) => {
                warn!(user_id, balance = previous, "balance rolled back");
                Ok(())
            }
            Err(e) => {
                error!(
                    user_id,
                    balance = previous,
                    error = %e,
                    "rollback failed, balance and history have diverged"
                );
                Err(e)
            }
        }
    }
}

fn describe_rollback(rollback: &Result<(), StoreError>) -> String {
    match rollback {
        Ok(()) => "balance rolled back".to_string(),
        Err(e) => format!("rollback failed: {e}"),
    }
}

fn validate_amount(user_id: UserId, amount: Point) -> Result<(), PointError> {
    if amount <= 0 {
        return Err(PointError::invalid_amount(user_id, amount));
    }
    Ok(())
}

//! History-related types for the Rust Points Engine
//!
//! This module defines transaction kinds, immutable history records and the
//! command type read from CSV input, plus the replay function that ties a
//! user's history back to their balance.

use super::point::{Point, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// History record identifier, assigned by the history log
pub type HistoryId = u64;

/// Kinds of point mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credit points to a user
    Charge,

    /// Debit points from a user, bounded by the current balance
    Use,
}

impl TransactionKind {
    /// Lowercase name used in CSV output and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Charge => "charge",
            TransactionKind::Use => "use",
        }
    }

    /// Signed balance delta this kind applies for `amount`
    pub fn signed(&self, amount: Point) -> Point {
        match self {
            TransactionKind::Charge => amount,
            TransactionKind::Use => -amount,
        }
    }
}

/// Immutable record of one committed charge or use
///
/// Records are created exactly once per successful mutation and are never
/// updated or deleted. Per user, they are ordered by insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointHistory {
    /// Monotonic id assigned by the history log
    pub id: HistoryId,

    /// The user this record belongs to
    pub user_id: UserId,

    /// Amount of the mutation (always positive)
    pub amount: Point,

    /// Whether points were charged or used
    pub kind: TransactionKind,

    /// Time taken by the engine once the request passed validation
    pub timestamp: DateTime<Utc>,
}

/// A requested mutation, as read from CSV input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointCommand {
    pub kind: TransactionKind,
    pub user_id: UserId,
    pub amount: Point,
}

/// Replay history records as signed deltas starting from zero
///
/// Returns `None` if the running sum overflows.
pub fn replay_balance(records: &[PointHistory]) -> Option<Point> {
    records.iter().try_fold(0 as Point, |balance, record| {
        balance.checked_add(record.kind.signed(record.amount))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: HistoryId, amount: Point, kind: TransactionKind) -> PointHistory {
        PointHistory {
            id,
            user_id: 1,
            amount,
            kind,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_replay_empty_history_is_zero() {
        assert_eq!(replay_balance(&[]), Some(0));
    }

    #[test]
    fn test_replay_applies_signed_deltas_in_order() {
        let records = vec![
            record(1, 1000, TransactionKind::Charge),
            record(2, 300, TransactionKind::Use),
            record(3, 50, TransactionKind::Charge),
        ];
        assert_eq!(replay_balance(&records), Some(750));
    }

    #[test]
    fn test_replay_overflow_returns_none() {
        let records = vec![
            record(1, Point::MAX, TransactionKind::Charge),
            record(2, 1, TransactionKind::Charge),
        ];
        assert_eq!(replay_balance(&records), None);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(TransactionKind::Charge.as_str(), "charge");
        assert_eq!(TransactionKind::Use.as_str(), "use");
        assert_eq!(TransactionKind::Use.signed(5), -5);
    }
}

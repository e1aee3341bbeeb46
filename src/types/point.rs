//! Balance-related types for the Rust Points Engine
//!
//! This module defines the UserPoint structure and the identifiers used
//! to address a user's point balance.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// User identifier
pub type UserId = i64;

/// Point amount
///
/// Signed so that non-positive requests can be represented and rejected
/// with `InvalidAmount` instead of failing to parse.
pub type Point = i64;

/// Current point balance of a single user
///
/// Balances are only ever mutated by the `PointEngine`. A user with no
/// stored balance is treated as holding zero points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserPoint {
    /// The user owning this balance
    pub user_id: UserId,

    /// Points currently held (never negative)
    pub point: Point,

    /// When the balance store last wrote this balance
    pub updated_at: DateTime<Utc>,
}

impl UserPoint {
    /// Create a balance with the given amount, stamped now
    pub fn new(user_id: UserId, point: Point) -> Self {
        UserPoint {
            user_id,
            point,
            updated_at: Utc::now(),
        }
    }

    /// Zero balance for a user that has never been charged
    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_zero_points() {
        let balance = UserPoint::empty(7);
        assert_eq!(balance.user_id, 7);
        assert_eq!(balance.point, 0);
        assert!(balance.updated_at.timestamp_millis() > 0);
    }
}

//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `point`: Balance types and identifiers
//! - `history`: Transaction kinds, history records and commands
//! - `error`: Error types for the points engine

pub mod error;
pub mod history;
pub mod point;

pub use error::{PointError, StoreError};
pub use history::{replay_balance, HistoryId, PointCommand, PointHistory, TransactionKind};
pub use point::{Point, UserId, UserPoint};

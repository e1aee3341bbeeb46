//! Error types for the Rust Points Engine
//!
//! This module defines all error types that can occur while mutating or
//! querying point balances, plus the failure type reported by storage
//! collaborators.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Non-positive amounts, insufficient balance
//! - **Persistence Errors**: Balance store or history log failures and detected inconsistencies
//! - **Coordination Errors**: Per-user lock wait exceeded
//! - **CSV Errors**: File I/O and malformed input for the batch CLI

use super::point::{Point, UserId};
use thiserror::Error;

/// Main error type for the points engine
///
/// Each variant carries enough context to diagnose the failure without
/// access to engine state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    /// Requested amount is zero or negative
    ///
    /// Raised before any read or write. Recoverable by retrying with a
    /// positive amount.
    #[error("Invalid amount {amount} for user {user_id}: amount must be greater than 0")]
    InvalidAmount {
        /// User the request targeted
        user_id: UserId,
        /// The rejected amount
        amount: Point,
    },

    /// Use amount exceeds the current balance
    ///
    /// Balance and history are left unchanged.
    #[error("Insufficient balance for user {user_id}: current {current}, requested {requested}")]
    InsufficientBalance {
        /// User the request targeted
        user_id: UserId,
        /// Balance at the time of the check
        current: Point,
        /// Requested use amount
        requested: Point,
    },

    /// A collaborator failed or returned inconsistent state during a mutation
    ///
    /// The engine does not retry. No partial commit is reported as success.
    #[error("Persistence failure during {operation} for user {user_id}: {message}")]
    PersistenceFailure {
        /// User the mutation targeted
        user_id: UserId,
        /// Operation that failed
        operation: String,
        /// What went wrong, including rollback outcome when one was attempted
        message: String,
    },

    /// The per-user lock could not be acquired in time
    ///
    /// Recoverable by retrying.
    #[error("Timed out after {waited_ms}ms waiting for user {user_id}")]
    Timeout {
        /// User whose lock was contended
        user_id: UserId,
        /// Configured wait bound in milliseconds
        waited_ms: u64,
    },

    /// Arithmetic overflow would occur
    ///
    /// The mutation is rejected to keep the balance representable.
    #[error("Arithmetic overflow in {operation} for user {user_id}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// User the mutation targeted
        user_id: UserId,
    },

    /// Replaying a user's history does not reproduce their balance
    #[error("History mismatch for user {user_id}: balance {balance}, replayed {replayed:?}")]
    HistoryMismatch {
        /// User that was verified
        user_id: UserId,
        /// Balance held by the balance store
        balance: Point,
        /// Sum of the history, `None` if the replay overflowed
        replayed: Option<Point>,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// The malformed record is skipped and processing continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unknown transaction type in CSV input
    #[error("Invalid transaction type '{tx_type}'")]
    InvalidTransactionType {
        /// The invalid transaction type string
        tx_type: String,
    },
}

/// Failure reported by a balance store or history log
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
        }
    }
}

// Conversion from io::Error to PointError
impl From<std::io::Error> for PointError {
    fn from(error: std::io::Error) -> Self {
        PointError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to PointError
impl From<csv::Error> for PointError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PointError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl PointError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(user_id: UserId, amount: Point) -> Self {
        PointError::InvalidAmount { user_id, amount }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user_id: UserId, current: Point, requested: Point) -> Self {
        PointError::InsufficientBalance {
            user_id,
            current,
            requested,
        }
    }

    /// Create a PersistenceFailure error
    pub fn persistence_failure(user_id: UserId, operation: &str, message: impl Into<String>) -> Self {
        PointError::PersistenceFailure {
            user_id,
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create a Timeout error
    pub fn timeout(user_id: UserId, waited_ms: u64) -> Self {
        PointError::Timeout { user_id, waited_ms }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user_id: UserId) -> Self {
        PointError::ArithmeticOverflow {
            operation: operation.to_string(),
            user_id,
        }
    }

    /// Create a HistoryMismatch error
    pub fn history_mismatch(user_id: UserId, balance: Point, replayed: Option<Point>) -> Self {
        PointError::HistoryMismatch {
            user_id,
            balance,
            replayed,
        }
    }

    /// Create an InvalidTransactionType error
    pub fn invalid_transaction_type(tx_type: &str) -> Self {
        PointError::InvalidTransactionType {
            tx_type: tx_type.to_string(),
        }
    }

    /// Create an IoError error
    pub fn io_error(message: impl Into<String>) -> Self {
        PointError::IoError {
            message: message.into(),
        }
    }

    /// Create a ParseError error
    pub fn parse_error(line: Option<u64>, message: impl Into<String>) -> Self {
        PointError::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Attach a line number to a ParseError that has none
    ///
    /// Other variants are returned unchanged.
    pub fn at_line(self, line: u64) -> Self {
        match self {
            PointError::ParseError { line: None, message } => PointError::ParseError {
                line: Some(line),
                message,
            },
            other => other,
        }
    }

    /// Whether retrying the same request unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PointError::Timeout { .. })
    }
}

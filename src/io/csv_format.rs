//! CSV format handling for point commands and engine output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization of `type,user,amount` rows
//! - Conversion from CSV records to `PointCommand`
//! - Balance and history output serialization
//!
//! All functions are pure (no file handling) for easy testing.

use crate::types::{PointCommand, PointError, PointHistory, TransactionKind, UserId, UserPoint};
use csv::Writer;
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, user, amount.
/// The amount is kept as text so that a missing or malformed value is
/// reported per row instead of failing the whole deserialization.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub user: UserId,
    pub amount: Option<String>,
}

/// Convert a CsvRecord to a PointCommand
///
/// The type is matched case-insensitively. The amount must be an integer;
/// its sign is left for the engine to validate, so `charge,1,-5` converts
/// and is later rejected with `InvalidAmount`.
///
/// # Errors
///
/// - `InvalidTransactionType` for anything other than charge or use
/// - `ParseError` (without line) for a missing or non-integer amount
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<PointCommand, PointError> {
    let kind = match csv_record.tx_type.to_lowercase().as_str() {
        "charge" => TransactionKind::Charge,
        "use" => TransactionKind::Use,
        _ => return Err(PointError::invalid_transaction_type(&csv_record.tx_type)),
    };

    let amount = match csv_record.amount.as_deref().map(str::trim) {
        Some(amount) if !amount.is_empty() => amount.parse().map_err(|_| {
            PointError::parse_error(
                None,
                format!("Invalid amount '{}' for user {}", amount, csv_record.user),
            )
        })?,
        _ => {
            return Err(PointError::parse_error(
                None,
                format!(
                    "{} for user {} requires an amount",
                    kind.as_str(),
                    csv_record.user
                ),
            ))
        }
    };

    Ok(PointCommand {
        kind,
        user_id: csv_record.user,
        amount,
    })
}

/// Write balances to CSV format
///
/// Writes balances with columns: user, point, updated_at (epoch millis).
/// Balances are sorted by user id for deterministic output.
pub fn write_balances_csv(
    balances: &[UserPoint],
    output: &mut dyn Write,
) -> Result<(), PointError> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["user", "point", "updated_at"])
        .map_err(|e| PointError::io_error(format!("Failed to write CSV header: {}", e)))?;

    let mut sorted_balances = balances.to_vec();
    sorted_balances.sort_by_key(|balance| balance.user_id);

    for balance in sorted_balances {
        writer
            .write_record(&[
                balance.user_id.to_string(),
                balance.point.to_string(),
                balance.updated_at.timestamp_millis().to_string(),
            ])
            .map_err(|e| PointError::io_error(format!("Failed to write balance record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| PointError::io_error(format!("Failed to flush output: {}", e)))?;

    Ok(())
}

/// Write history records to CSV format
///
/// Writes records with columns: id, user, type, amount, timestamp (epoch
/// millis). Records are sorted by id, which is also commit order.
pub fn write_history_csv(
    records: &[PointHistory],
    output: &mut dyn Write,
) -> Result<(), PointError> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "user", "type", "amount", "timestamp"])
        .map_err(|e| PointError::io_error(format!("Failed to write CSV header: {}", e)))?;

    let mut sorted_records = records.to_vec();
    sorted_records.sort_by_key(|record| record.id);

    for record in sorted_records {
        writer
            .write_record(&[
                record.id.to_string(),
                record.user_id.to_string(),
                record.kind.as_str().to_string(),
                record.amount.to_string(),
                record.timestamp.timestamp_millis().to_string(),
            ])
            .map_err(|e| PointError::io_error(format!("Failed to write history record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| PointError::io_error(format!("Failed to flush output: {}", e)))?;

    Ok(())
}

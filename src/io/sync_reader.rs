//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over point commands from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<PointCommand, PointError>` for each CSV row:
//!
//! ```no_run
//! use rust_points_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Processing command: {:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Row errors are yielded as Err variants and iteration continues
//! - Parse errors carry the line number (the header is line 1)

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{PointCommand, PointError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Reads one row at a time, so memory use does not grow with file size.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a CSV file for streaming iteration
    ///
    /// Fields are trimmed and rows may omit the amount column.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, PointError> {
        let file = File::open(path).map_err(|e| {
            PointError::io_error(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<PointCommand, PointError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        let line = self.line_num;
        Some(match row {
            Ok(csv_record) => convert_csv_record(csv_record).map_err(|e| e.at_line(line)),
            Err(e) => Err(PointError::from(e).at_line(line)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));

        match result {
            Err(PointError::IoError { message }) => {
                assert!(message.contains("Failed to open file"));
            }
            other => panic!("Expected IoError, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_iterates_records_in_order() {
        let file = create_temp_csv("type,user,amount\ncharge,1,1000\nuse,1,300\ncharge,2,5\n");

        let reader = SyncReader::new(file.path()).unwrap();
        let commands: Vec<_> = reader.map(Result::unwrap).collect();

        assert_eq!(
            commands,
            vec![
                PointCommand {
                    kind: TransactionKind::Charge,
                    user_id: 1,
                    amount: 1000
                },
                PointCommand {
                    kind: TransactionKind::Use,
                    user_id: 1,
                    amount: 300
                },
                PointCommand {
                    kind: TransactionKind::Charge,
                    user_id: 2,
                    amount: 5
                },
            ]
        );
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv("type,user,amount\ncharge,1,100\ncharge,2,invalid\nuse,1,50\n");

        let reader = SyncReader::new(file.path()).unwrap();
        let records: Vec<_> = reader.collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[2].is_ok());
        match &records[1] {
            Err(PointError::ParseError { line, message }) => {
                assert_eq!(*line, Some(3)); // header is line 1
                assert!(message.contains("Invalid amount"));
            }
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_reports_non_numeric_user() {
        let file = create_temp_csv("type,user,amount\ncharge,alice,100\ncharge,2,10\n");

        let reader = SyncReader::new(file.path()).unwrap();
        let records: Vec<_> = reader.collect();

        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], Err(PointError::ParseError { .. })));
        assert_eq!(records[1].as_ref().unwrap().user_id, 2);
    }

    #[test]
    fn test_sync_reader_continues_after_invalid_type() {
        let file = create_temp_csv("type,user,amount\ncharge,1,100\nrefund,2,50\nuse,1,75\n");

        let reader = SyncReader::new(file.path()).unwrap();
        let records: Vec<_> = reader.collect();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[1].as_ref().unwrap_err(),
            &PointError::invalid_transaction_type("refund")
        );
        assert!(records[2].is_ok());
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_case() {
        let file = create_temp_csv("type,user,amount\n  CHARGE  ,  1  ,  100  \n");

        let reader = SyncReader::new(file.path()).unwrap();
        let commands: Vec<_> = reader.filter_map(Result::ok).collect();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].kind, TransactionKind::Charge);
        assert_eq!(commands[0].user_id, 1);
        assert_eq!(commands[0].amount, 100);
    }

    #[test]
    fn test_sync_reader_missing_amount_column() {
        let file = create_temp_csv("type,user,amount\nuse,1\n");

        let reader = SyncReader::new(file.path()).unwrap();
        let records: Vec<_> = reader.collect();

        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0],
            Err(PointError::ParseError { line: Some(2), .. })
        ));
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("type,user,amount\n");

        let reader = SyncReader::new(file.path()).unwrap();
        assert_eq!(reader.count(), 0);
    }
}

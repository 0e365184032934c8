//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while reading or writing report tables as CSV
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record does not fit the header
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// The records do not form a valid table (e.g. duplicate header names)
    #[error("Table error: {0}")]
    Core(#[from] pivot_report_core::Error),
}

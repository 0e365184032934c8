//! Error types for pivot-report-core

use thiserror::Error;

use crate::sink::SinkError;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pivot-report-core
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced column is not part of the table schema
    #[error("Column not found: {column}")]
    Schema { column: String },

    /// The input table has no rows
    #[error("Input table has no rows")]
    EmptyInput,

    /// No key columns were given for deduplication
    #[error("At least one key column is required")]
    NoKeyColumns,

    /// A column name appears twice in a schema
    #[error("Column already exists: {0}")]
    DuplicateColumn(String),

    /// A row does not match the schema width
    #[error("Row has {actual} values, schema has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// The sink lacks a capability the caller asked for
    #[error("Unsupported by report sink: {0}")]
    Unsupported(String),

    /// Error raised by the report sink
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl Error {
    /// Create a schema error for a missing column
    pub fn missing_column<S: Into<String>>(column: S) -> Self {
        Error::Schema {
            column: column.into(),
        }
    }
}

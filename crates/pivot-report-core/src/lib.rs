//! # pivot-report-core
//!
//! Data preparation for monthly pivot reports.
//!
//! This crate provides the pieces that do not depend on any spreadsheet host:
//! - [`derive_month_key`] - buckets a date column into `MMM-yyyy` keys
//! - [`build_distinct_source`] - deduplicates rows on a key tuple, first seen wins
//! - [`RollupIndex`] - hierarchical counts and grand totals, as a pivot shows them
//! - [`ReportSink`] - the interface a spreadsheet writer implements
//! - [`prepare`] / [`publish`] - the pipeline tying them together
//!
//! ## Example
//!
//! ```rust
//! use pivot_report_core::{build_distinct_source, derive_month_key, Table, Value};
//!
//! let table = Table::from_rows(
//!     ["ApplicationID", "AppliedOn", "ApplicationName", "Category"],
//!     vec![
//!         vec!["App1".into(), Value::date(2025, 1, 2), "Alpha".into(), "Finance".into()],
//!         vec!["App2".into(), Value::date(2025, 1, 8), "Beta".into(), "Retail".into()],
//!         vec!["App1".into(), Value::date(2025, 1, 20), "Alpha".into(), "Finance".into()],
//!     ],
//! )
//! .unwrap();
//!
//! let derived = derive_month_key(table, "AppliedOn", "ApplicationMonth").unwrap();
//! let source = build_distinct_source(
//!     &derived.table,
//!     &["ApplicationMonth", "ApplicationID", "ApplicationName", "Category"],
//! )
//! .unwrap();
//!
//! assert_eq!(source.table().row_count(), 2);
//! assert_eq!(source.rollup().grand_total(), 2);
//! ```

pub mod address;
pub mod distinct;
pub mod error;
pub mod month_key;
pub mod pipeline;
pub mod rollup;
pub mod sink;
pub mod table;
pub mod value;

// Re-exports for convenience
pub use address::{CellAddress, CellRange};
pub use distinct::{build_distinct_source, DistinctSource};
pub use error::{Error, Result};
pub use month_key::{
    derive_month_key, format_month_key, is_month_key, parse_date_text, DateParseFailure,
    MonthKeyDiagnostics, MonthKeyOutput,
};
pub use pipeline::{
    prepare, publish, run_report, PivotStrategy, PreparedReport, ReportConfig, ReportOutcome,
};
pub use rollup::{RollupIndex, RollupNode};
pub use sink::{
    validate_sheet_name, MeasureKind, PivotHandle, PivotRequest, ReportSink, SinkCapabilities,
    SinkError, SinkResult, SourceRef,
};
pub use table::{Row, Table};
pub use value::Value;

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

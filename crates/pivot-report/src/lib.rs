//! # pivot-report
//!
//! Builds monthly distinct-count pivot reports from tabular data.
//!
//! The library re-exports the data preparation of `pivot-report-core` and the
//! CSV reader/writer of `pivot-report-csv`, and adds [`MemorySink`], a
//! [`ReportSink`] that renders pivots in memory and saves them as JSON or CSV.
//!
//! ## Features
//!
//! - Month keys (`Jan-2025`) derived from mixed date cells
//! - Deduplicated pivot sources, first occurrence wins
//! - Hierarchical counts and grand totals, as row counts or distinct counts
//! - Pluggable sinks selected by capability
//!
//! ## Example
//!
//! ```rust
//! use pivot_report::prelude::*;
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
//! let config = ReportConfig::default();
//! let prepared = prepare(table, &config).unwrap();
//! assert_eq!(prepared.distinct.distinct_count(), 2);
//!
//! let mut sink = MemorySink::new();
//! let path = std::env::temp_dir().join("pivot_report_doc.json");
//! let outcome = publish(&prepared, &config, &mut sink, &path).unwrap();
//! assert_eq!(outcome.pivot.grand_total, 2);
//! ```

pub mod memory;
pub mod prelude;

pub use memory::{MemorySink, PivotRecord, Sheet, BLANK_LABEL, GRAND_TOTAL_LABEL};

// Re-export core types
pub use pivot_report_core::{
    build_distinct_source, derive_month_key, format_month_key, is_month_key, parse_date_text,
    prepare, publish, run_report, validate_sheet_name, CellAddress, CellRange, DateParseFailure,
    DistinctSource, Error, MeasureKind, MonthKeyDiagnostics, MonthKeyOutput, PivotHandle,
    PivotRequest, PivotStrategy, PreparedReport, ReportConfig, ReportOutcome, ReportSink, Result,
    RollupIndex, RollupNode, Row, SinkCapabilities, SinkError, SinkResult, SourceRef, Table,
    Value, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use pivot_report_csv::{
    CsvError, CsvReadOptions, CsvReader, CsvResult, CsvWriteOptions, CsvWriter, LineTerminator,
};

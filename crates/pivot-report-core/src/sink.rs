//! Report sink interface
//!
//! The sink owns everything that is not data preparation: sheets, cell
//! writes, pivot rendering and persistence. Differences between sinks (for
//! example whether a distinct-count aggregation exists) are exposed through
//! [`SinkCapabilities`] rather than discovered by trial and error.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::address::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::table::Table;
use crate::MAX_SHEET_NAME_LEN;

/// Characters a sheet name may not contain
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Check a sheet name: 1 to 31 characters, none of `[]:*?/\`
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(Error::InvalidSheetName(format!(
            "'{}' must have 1 to {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
        return Err(Error::InvalidSheetName(format!(
            "'{}' contains '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Errors raised by a report sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// A table or label could not be written
    #[error("Write to '{sheet}'!{cell} failed: {message}")]
    Write {
        sheet: String,
        cell: String,
        message: String,
    },

    /// The pivot source reference does not match a written table
    #[error("Unknown pivot source: {0}")]
    UnknownSource(String),

    /// The pivot could not be rendered
    #[error("Pivot '{name}' failed: {message}")]
    Pivot { name: String, message: String },

    /// The artifact could not be saved
    #[error("Save to '{}' failed: {message}", path.display())]
    Save { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// What a sink can do beyond the required operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkCapabilities {
    /// The sink can aggregate a distinct count over a live source
    pub distinct_count: bool,
}

/// Aggregation applied to the pivot's measure column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MeasureKind {
    /// Number of rows
    Count,
    /// Number of distinct measure values
    DistinctCount,
}

/// A table written to a sink, addressable as a pivot source
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRef {
    /// Sheet holding the table
    pub sheet: String,
    /// Header row plus data rows
    pub range: CellRange,
}

impl SourceRef {
    /// `Sheet!A3:E10` form
    pub fn to_a1_string(&self) -> String {
        format!("{}!{}", self.sheet, self.range)
    }
}

/// Everything a sink needs to render a pivot
#[derive(Debug, Clone)]
pub struct PivotRequest {
    /// Pivot name
    pub name: String,
    /// Table the pivot reads
    pub source: SourceRef,
    /// Row fields, outermost first
    pub hierarchy: Vec<String>,
    /// Display caption per row field (same length as `hierarchy`)
    pub captions: Vec<String>,
    /// Column aggregated by the measure
    pub measure_column: String,
    /// Display caption of the measure
    pub measure_caption: String,
    /// Aggregation applied to the measure
    pub measure_kind: MeasureKind,
    /// Sheet receiving the pivot
    pub destination_sheet: String,
    /// Top-left cell of the pivot
    pub destination: CellAddress,
    /// Emit a grand total row
    pub grand_totals: bool,
}

/// A rendered pivot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PivotHandle {
    /// Pivot name
    pub name: String,
    /// Sheet holding the pivot
    pub sheet: String,
    /// Cells occupied by the pivot
    pub range: CellRange,
    /// Grand total shown by the pivot
    pub grand_total: usize,
}

/// Destination of a finished report
pub trait ReportSink {
    /// Optional operations this sink supports
    fn capabilities(&self) -> SinkCapabilities;

    /// Write `table` (header row first) with its top-left cell at `origin`
    fn write_table(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        table: &Table,
    ) -> SinkResult<SourceRef>;

    /// Write a single text cell (titles, footers)
    fn write_label(&mut self, sheet: &str, cell: CellAddress, text: &str) -> SinkResult<()>;

    /// Materialize a pivot over a previously written table
    fn render_pivot(&mut self, request: &PivotRequest) -> SinkResult<PivotHandle>;

    /// Persist the report, returning the path written
    fn save(&mut self, path: &Path) -> SinkResult<PathBuf>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn capabilities(&self) -> SinkCapabilities {
        (**self).capabilities()
    }

    fn write_table(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        table: &Table,
    ) -> SinkResult<SourceRef> {
        (**self).write_table(sheet, origin, table)
    }

    fn write_label(&mut self, sheet: &str, cell: CellAddress, text: &str) -> SinkResult<()> {
        (**self).write_label(sheet, cell, text)
    }

    fn render_pivot(&mut self, request: &PivotRequest) -> SinkResult<PivotHandle> {
        (**self).render_pivot(request)
    }

    fn save(&mut self, path: &Path) -> SinkResult<PathBuf> {
        (**self).save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_names() {
        assert!(validate_sheet_name("Report").is_ok());
        assert!(validate_sheet_name("PivotSource").is_ok());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());

        let long = "x".repeat(32);
        for bad in ["", "Q1/Q2", "a[1]", "What?", "C:\\", long.as_str()] {
            assert!(
                matches!(validate_sheet_name(bad), Err(Error::InvalidSheetName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_source_ref_display() {
        let source = SourceRef {
            sheet: "Data".into(),
            range: CellRange::new(CellAddress::new(2, 0), CellAddress::new(5, 4)),
        };
        assert_eq!(source.to_a1_string(), "Data!A3:E6");
    }
}

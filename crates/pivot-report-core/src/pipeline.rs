//! Report pipeline
//!
//! [`prepare`] is pure: it derives the month column, deduplicates and computes
//! both rollups. [`publish`] resolves the pivot strategy against the sink's
//! capabilities and then drives the sink. Every configuration and
//! aggregation error surfaces before the first sink call, so a failed run
//! never leaves a partially written report behind. Pivot and footer
//! placement are checked against the compact layout (header row, one row per
//! rollup node, grand total row); a sink rendering a taller pivot can still
//! fail late with [`Error::InvalidAddress`].

use std::path::{Path, PathBuf};

use crate::address::CellAddress;
use crate::distinct::{build_distinct_source, DistinctSource};
use crate::error::{Error, Result};
use crate::month_key::{derive_month_key, MonthKeyDiagnostics};
use crate::rollup::RollupIndex;
use crate::sink::{validate_sheet_name, MeasureKind, PivotHandle, PivotRequest, ReportSink};
use crate::table::Table;

/// How the pivot's distinct count is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PivotStrategy {
    /// Distinct count when the sink supports it, deduplicated otherwise
    #[default]
    Auto,
    /// Distinct-count measure over the full data table
    DistinctCount,
    /// Count measure over the deduplicated table
    Deduplicated,
}

impl PivotStrategy {
    /// Pick a concrete strategy for a sink
    pub fn resolve(self, sink_distinct_count: bool) -> Result<PivotStrategy> {
        match self {
            PivotStrategy::Auto if sink_distinct_count => Ok(PivotStrategy::DistinctCount),
            PivotStrategy::Auto => Ok(PivotStrategy::Deduplicated),
            PivotStrategy::DistinctCount if !sink_distinct_count => Err(Error::Unsupported(
                "distinct-count aggregation".to_string(),
            )),
            other => Ok(other),
        }
    }
}

/// Column names, sheet layout and captions of a report
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReportConfig {
    /// Date-bearing input column
    pub date_column: String,
    /// Identity column counted by the measure
    pub id_column: String,
    /// Second row field
    pub name_column: String,
    /// Third row field
    pub category_column: String,
    /// Derived month-key column
    pub month_column: String,

    /// Sheet receiving the prepared data
    pub data_sheet: String,
    /// Header cell of the prepared data
    pub data_origin: String,
    /// Sheet receiving the deduplicated source
    pub source_sheet: String,
    /// Header cell of the deduplicated source
    pub source_origin: String,

    /// Sheet receiving the pivot
    pub report_sheet: String,
    /// Report title, if any
    pub title: Option<String>,
    /// Cell of the title
    pub title_cell: String,
    /// Pivot name
    pub pivot_name: String,
    /// Top-left cell of the pivot
    pub pivot_cell: String,
    /// Caption of the month row field
    pub month_caption: String,
    /// Caption of the name row field
    pub name_caption: String,
    /// Caption of the category row field
    pub category_caption: String,
    /// Caption of the measure
    pub measure_caption: String,
    /// Footer text, if any
    pub footer: Option<String>,
    /// Rows between the pivot's last row and the footer
    pub footer_gap: u32,
    /// Grand total row
    pub grand_totals: bool,

    /// Pivot strategy
    pub strategy: PivotStrategy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            date_column: "AppliedOn".into(),
            id_column: "ApplicationID".into(),
            name_column: "ApplicationName".into(),
            category_column: "Category".into(),
            month_column: "ApplicationMonth".into(),
            data_sheet: "Data".into(),
            data_origin: "A3".into(),
            source_sheet: "PivotSource".into(),
            source_origin: "A3".into(),
            report_sheet: "Report".into(),
            title: Some("Monthly Application Onboarding Report".into()),
            title_cell: "A5".into(),
            pivot_name: "MonthlyPivot".into(),
            pivot_cell: "A7".into(),
            month_caption: "Application Month".into(),
            name_caption: "ApplicationName".into(),
            category_caption: "Category".into(),
            measure_caption: "Distinct Applications".into(),
            footer: Some("Internal".into()),
            footer_gap: 2,
            grand_totals: true,
            strategy: PivotStrategy::Auto,
        }
    }
}

impl ReportConfig {
    /// Deduplication key: month, identity, name, category
    pub fn key_columns(&self) -> [&str; 4] {
        [
            self.month_column.as_str(),
            self.id_column.as_str(),
            self.name_column.as_str(),
            self.category_column.as_str(),
        ]
    }

    /// Pivot row fields: month, name, category
    pub fn hierarchy(&self) -> [&str; 3] {
        [
            self.month_column.as_str(),
            self.name_column.as_str(),
            self.category_column.as_str(),
        ]
    }

    fn captions(&self) -> Vec<String> {
        vec![
            self.month_caption.clone(),
            self.name_caption.clone(),
            self.category_caption.clone(),
        ]
    }

    fn layout(&self) -> Result<Layout> {
        for sheet in [&self.data_sheet, &self.source_sheet, &self.report_sheet] {
            validate_sheet_name(sheet)?;
        }
        let pivot_cell = CellAddress::parse(&self.pivot_cell)?;
        if self.footer.is_some() {
            pivot_cell.offset(self.footer_gap, 0)?;
        }
        Ok(Layout {
            data_origin: CellAddress::parse(&self.data_origin)?,
            source_origin: CellAddress::parse(&self.source_origin)?,
            title_cell: CellAddress::parse(&self.title_cell)?,
            pivot_cell,
        })
    }

    /// Check that a compact pivot over `rollup`, and the footer below it, fit
    fn check_pivot_fits(&self, pivot_cell: CellAddress, rollup: &RollupIndex) -> Result<()> {
        let rows = 1 + rollup.nodes().len() + usize::from(self.grand_totals);
        let mut below = u32::try_from(rows - 1).map_err(|_| {
            Error::InvalidAddress(format!("{} pivot rows at {}", rows, pivot_cell))
        })?;
        if self.footer.is_some() {
            below = below.saturating_add(self.footer_gap);
        }
        pivot_cell.offset(below, 1).map(|_| ())
    }
}

/// Parsed cell positions of a [`ReportConfig`]
#[derive(Debug, Clone, Copy)]
struct Layout {
    data_origin: CellAddress,
    source_origin: CellAddress,
    title_cell: CellAddress,
    pivot_cell: CellAddress,
}

/// Data ready to hand to a sink
#[derive(Debug, Clone)]
pub struct PreparedReport {
    /// Input rows with the month column populated
    pub data: Table,
    /// Date handling diagnostics
    pub diagnostics: MonthKeyDiagnostics,
    /// Deduplicated source keyed by month, identity, name, category
    pub distinct: DistinctSource,
    /// Row counts over the deduplicated source by month, name, category
    pub pivot_rollup: RollupIndex,
    /// Distinct identity counts over the full data by month, name, category
    pub distinct_count_rollup: RollupIndex,
}

impl PreparedReport {
    /// Rollup a pivot built with `strategy` would show
    pub fn rollup_for(&self, strategy: PivotStrategy) -> &RollupIndex {
        match strategy {
            PivotStrategy::DistinctCount => &self.distinct_count_rollup,
            PivotStrategy::Auto | PivotStrategy::Deduplicated => &self.pivot_rollup,
        }
    }
}

/// Result of a published report
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Path the sink saved to
    pub path: PathBuf,
    /// Strategy actually used
    pub strategy: PivotStrategy,
    /// Rendered pivot
    pub pivot: PivotHandle,
    /// Date handling diagnostics
    pub diagnostics: MonthKeyDiagnostics,
}

/// Derive the month column, deduplicate and compute rollups
///
/// # Errors
///
/// [`Error::Schema`] when a configured column is missing and
/// [`Error::EmptyInput`] when `table` has no rows.
pub fn prepare(table: Table, config: &ReportConfig) -> Result<PreparedReport> {
    let derived = derive_month_key(table, &config.date_column, &config.month_column)?;
    let data = derived.table;

    let distinct = build_distinct_source(&data, &config.key_columns())?;
    let hierarchy = config.hierarchy();
    let pivot_rollup = RollupIndex::count_rows(distinct.table(), &hierarchy)?;
    let distinct_count_rollup =
        RollupIndex::distinct_count(&data, &hierarchy, &config.id_column)?;

    tracing::debug!(
        "Prepared {} rows: {} distinct, grand total {}",
        data.row_count(),
        distinct.distinct_count(),
        pivot_rollup.grand_total()
    );

    Ok(PreparedReport {
        data,
        diagnostics: derived.diagnostics,
        distinct,
        pivot_rollup,
        distinct_count_rollup,
    })
}

/// Write a prepared report to `sink` and save it to `path`
///
/// # Errors
///
/// Configuration errors ([`Error::InvalidAddress`],
/// [`Error::InvalidSheetName`], [`Error::Unsupported`]) are raised before the
/// sink is touched; sink errors propagate unchanged as
/// [`Error::Sink`].
pub fn publish<S: ReportSink>(
    prepared: &PreparedReport,
    config: &ReportConfig,
    sink: &mut S,
    path: &Path,
) -> Result<ReportOutcome> {
    let layout = config.layout()?;
    let strategy = config.strategy.resolve(sink.capabilities().distinct_count)?;
    config.check_pivot_fits(layout.pivot_cell, prepared.rollup_for(strategy))?;

    let data_ref = sink.write_table(&config.data_sheet, layout.data_origin, &prepared.data)?;

    let (source, measure_kind) = match strategy {
        PivotStrategy::Deduplicated => {
            let source_ref = sink.write_table(
                &config.source_sheet,
                layout.source_origin,
                prepared.distinct.table(),
            )?;
            (source_ref, MeasureKind::Count)
        }
        _ => (data_ref, MeasureKind::DistinctCount),
    };

    if let Some(title) = &config.title {
        sink.write_label(&config.report_sheet, layout.title_cell, title)?;
    }

    let request = PivotRequest {
        name: config.pivot_name.clone(),
        source,
        hierarchy: config.hierarchy().iter().map(|s| s.to_string()).collect(),
        captions: config.captions(),
        measure_column: config.id_column.clone(),
        measure_caption: config.measure_caption.clone(),
        measure_kind,
        destination_sheet: config.report_sheet.clone(),
        destination: layout.pivot_cell,
        grand_totals: config.grand_totals,
    };
    let pivot = sink.render_pivot(&request)?;

    if let Some(footer) = &config.footer {
        let footer_cell = CellAddress::new(pivot.range.end.row, pivot.range.start.col)
            .offset(config.footer_gap, 0)?;
        sink.write_label(&config.report_sheet, footer_cell, footer)?;
    }

    let path = sink.save(path)?;
    tracing::info!(
        "Saved report to {} ({:?}, grand total {})",
        path.display(),
        strategy,
        pivot.grand_total
    );

    Ok(ReportOutcome {
        path,
        strategy,
        pivot,
        diagnostics: prepared.diagnostics.clone(),
    })
}

/// [`prepare`] followed by [`publish`]
pub fn run_report<S: ReportSink>(
    table: Table,
    config: &ReportConfig,
    sink: &mut S,
    path: &Path,
) -> Result<ReportOutcome> {
    let prepared = prepare(table, config)?;
    publish(&prepared, config, sink, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_resolution() {
        assert_eq!(
            PivotStrategy::Auto.resolve(true).unwrap(),
            PivotStrategy::DistinctCount
        );
        assert_eq!(
            PivotStrategy::Auto.resolve(false).unwrap(),
            PivotStrategy::Deduplicated
        );
        assert_eq!(
            PivotStrategy::Deduplicated.resolve(true).unwrap(),
            PivotStrategy::Deduplicated
        );
        assert!(matches!(
            PivotStrategy::DistinctCount.resolve(false),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_default_config_columns() {
        let config = ReportConfig::default();
        assert_eq!(
            config.key_columns(),
            ["ApplicationMonth", "ApplicationID", "ApplicationName", "Category"]
        );
        assert_eq!(
            config.hierarchy(),
            ["ApplicationMonth", "ApplicationName", "Category"]
        );
        let layout = config.layout().unwrap();
        assert_eq!(layout.pivot_cell, CellAddress::new(6, 0));
        assert_eq!(layout.data_origin, CellAddress::new(2, 0));
    }

    #[test]
    fn test_bad_layout_is_rejected() {
        let config = ReportConfig {
            pivot_cell: "7A".into(),
            ..Default::default()
        };
        assert!(matches!(config.layout(), Err(Error::InvalidAddress(_))));

        let config = ReportConfig {
            report_sheet: "Report: 2025".into(),
            ..Default::default()
        };
        assert!(matches!(config.layout(), Err(Error::InvalidSheetName(_))));

        let config = ReportConfig {
            footer_gap: 2_000_000,
            ..Default::default()
        };
        assert!(matches!(config.layout(), Err(Error::InvalidAddress(_))));

        let config = ReportConfig {
            footer_gap: 2_000_000,
            footer: None,
            ..Default::default()
        };
        assert!(config.layout().is_ok());
    }

    #[test]
    fn test_pivot_must_fit_above_last_row() {
        let table = Table::from_rows(
            ["Month", "Name"],
            vec![
                vec!["Jan-2025".into(), "Alpha".into()],
                vec!["Jan-2025".into(), "Beta".into()],
            ],
        )
        .unwrap();
        // Header, Jan-2025, Alpha, Beta, Grand Total
        let rollup = RollupIndex::count_rows(&table, &["Month", "Name"]).unwrap();
        let config = ReportConfig {
            footer: None,
            ..Default::default()
        };

        let last = crate::MAX_ROWS - 1;
        assert!(config
            .check_pivot_fits(CellAddress::new(last - 4, 0), &rollup)
            .is_ok());
        assert!(config
            .check_pivot_fits(CellAddress::new(last - 3, 0), &rollup)
            .is_err());

        let config = ReportConfig::default();
        assert!(config
            .check_pivot_fits(CellAddress::new(last - 6, 0), &rollup)
            .is_ok());
        assert!(config
            .check_pivot_fits(CellAddress::new(last - 5, 0), &rollup)
            .is_err());
    }
}

//! In-memory report sink
//!
//! [`MemorySink`] keeps every sheet as a sparse cell grid and renders pivots
//! from the tables written to it, laid out in compact form: one label column
//! indented by level, one count column, and a grand total row. A finished
//! report is saved as a JSON snapshot of all sheets or as the CSV of the
//! sheet holding the pivot.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pivot_report_core::{
    validate_sheet_name, CellAddress, CellRange, Error, MeasureKind, PivotHandle, PivotRequest,
    ReportSink, RollupIndex, SinkCapabilities, SinkError, SinkResult, SourceRef, Table, Value,
};
use pivot_report_csv::{CsvWriteOptions, CsvWriter};
use serde::Serialize;

/// Label of the grand total row
pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// Label shown for empty row-field values
pub const BLANK_LABEL: &str = "(blank)";

/// Indentation added per hierarchy level
const INDENT: &str = "  ";

/// A sheet of sparse cells
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<CellAddress, Value>,
}

impl Sheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: BTreeMap::new(),
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value at `addr`, `None` for empty cells
    pub fn cell(&self, addr: CellAddress) -> Option<&Value> {
        self.cells.get(&addr)
    }

    /// Value at an A1-style address, `None` for empty cells or bad addresses
    pub fn value(&self, a1: &str) -> Option<&Value> {
        CellAddress::parse(a1).ok().and_then(|addr| self.cell(addr))
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Smallest range covering every non-empty cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut addrs = self.cells.keys();
        let first = *addrs.next()?;
        let (start, end) = addrs.fold((first, first), |(start, end), addr| {
            (
                CellAddress::new(start.row.min(addr.row), start.col.min(addr.col)),
                CellAddress::new(end.row.max(addr.row), end.col.max(addr.col)),
            )
        });
        Some(CellRange::new(start, end))
    }

    /// Dense rows from `A1` to the bottom-right used cell, empty cells null
    pub fn grid(&self) -> Vec<Vec<Value>> {
        let Some(range) = self.used_range() else {
            return Vec::new();
        };
        (0..=range.end.row)
            .map(|row| {
                (0..=range.end.col)
                    .map(|col| {
                        self.cell(CellAddress::new(row, col))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    fn set(&mut self, addr: CellAddress, value: Value) {
        if value.is_null() {
            self.cells.remove(&addr);
        } else {
            self.cells.insert(addr, value);
        }
    }
}

/// A pivot rendered by a [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRecord {
    /// Where the pivot landed and its grand total
    pub handle: PivotHandle,
    /// Table the pivot reads
    pub source: SourceRef,
    /// Aggregation of the measure
    pub measure_kind: MeasureKind,
    /// Column aggregated by the measure
    pub measure_column: String,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    sheets: Vec<SheetSnapshot<'a>>,
    pivots: &'a [PivotRecord],
}

#[derive(Serialize)]
struct SheetSnapshot<'a> {
    name: &'a str,
    range: Option<String>,
    rows: Vec<Vec<Value>>,
}

/// Report sink holding sheets in memory
#[derive(Debug, Clone)]
pub struct MemorySink {
    capabilities: SinkCapabilities,
    sheets: Vec<Sheet>,
    sources: Vec<(SourceRef, Table)>,
    pivots: Vec<PivotRecord>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// Create an empty sink that supports distinct-count pivots
    pub fn new() -> Self {
        Self::with_capabilities(SinkCapabilities {
            distinct_count: true,
        })
    }

    /// Create an empty sink advertising `capabilities`
    pub fn with_capabilities(capabilities: SinkCapabilities) -> Self {
        Self {
            capabilities,
            sheets: Vec::new(),
            sources: Vec::new(),
            pivots: Vec::new(),
        }
    }

    /// Sheets in creation order
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheet names in creation order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    /// Sheet by name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Table registered under `source`
    pub fn source(&self, source: &SourceRef) -> Option<&Table> {
        self.sources
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, table)| table)
    }

    /// Rendered pivots in render order
    pub fn pivots(&self) -> &[PivotRecord] {
        &self.pivots
    }

    /// True when nothing has been written
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    fn sheet_mut(&mut self, name: &str, cell: CellAddress) -> SinkResult<&mut Sheet> {
        let index = match self.sheets.iter().position(|s| s.name == name) {
            Some(i) => i,
            None => {
                validate_sheet_name(name).map_err(|e| write_error(name, cell, e))?;
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        Ok(&mut self.sheets[index])
    }

    /// Sheet saved as CSV: the latest pivot's sheet, else the first sheet
    fn report_sheet(&self) -> Option<&Sheet> {
        self.pivots
            .last()
            .and_then(|p| self.sheet(&p.handle.sheet))
            .or_else(|| self.sheets.first())
    }

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            sheets: self
                .sheets
                .iter()
                .map(|sheet| SheetSnapshot {
                    name: &sheet.name,
                    range: sheet.used_range().map(|r| r.to_a1_string()),
                    rows: sheet.grid(),
                })
                .collect(),
            pivots: &self.pivots,
        }
    }

    fn pivot_lines(request: &PivotRequest, rollup: &RollupIndex) -> Vec<[Value; 2]> {
        let mut lines = Vec::with_capacity(rollup.nodes().len() + 2);
        lines.push([
            Value::string(request.captions.first().cloned().unwrap_or_default()),
            Value::string(request.measure_caption.as_str()),
        ]);
        for (level, node) in rollup.nodes() {
            let label = match node.value() {
                value if value.is_null() || value.as_str() == Some("") => BLANK_LABEL.to_string(),
                value => value.to_string(),
            };
            lines.push([
                Value::String(format!("{}{}", INDENT.repeat(level), label)),
                Value::Integer(node.count() as i64),
            ]);
        }
        if request.grand_totals {
            lines.push([
                Value::string(GRAND_TOTAL_LABEL),
                Value::Integer(rollup.grand_total() as i64),
            ]);
        }
        lines
    }
}

fn write_error(sheet: &str, cell: CellAddress, err: Error) -> SinkError {
    SinkError::Write {
        sheet: sheet.to_string(),
        cell: cell.to_a1_string(),
        message: err.to_string(),
    }
}

/// Range of `rows` x `cols` cells at `origin`, checked against sheet bounds
fn block_range(
    origin: CellAddress,
    rows: usize,
    cols: usize,
) -> pivot_report_core::Result<CellRange> {
    let rows = u32::try_from(rows)
        .map_err(|_| Error::InvalidAddress(format!("{rows} rows at {origin}")))?;
    let cols = u16::try_from(cols)
        .map_err(|_| Error::InvalidAddress(format!("{cols} columns at {origin}")))?;
    CellRange::from_origin(origin, rows, cols)
}

impl ReportSink for MemorySink {
    fn capabilities(&self) -> SinkCapabilities {
        self.capabilities
    }

    fn write_table(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        table: &Table,
    ) -> SinkResult<SourceRef> {
        let range = block_range(origin, table.row_count() + 1, table.column_count().max(1))
            .map_err(|e| write_error(sheet, origin, e))?;

        let target = self.sheet_mut(sheet, origin)?;
        let at = |row: usize, col: usize| {
            CellAddress::new(origin.row + row as u32, origin.col + col as u16)
        };
        for (col, name) in table.columns().iter().enumerate() {
            target.set(at(0, col), Value::string(name.as_str()));
        }
        for (row, values) in table.rows().iter().enumerate() {
            for (col, value) in values.values().iter().enumerate() {
                target.set(at(row + 1, col), value.clone());
            }
        }

        let source = SourceRef {
            sheet: sheet.to_string(),
            range,
        };
        self.sources
            .retain(|(s, _)| !(s.sheet == source.sheet && s.range.overlaps(&range)));
        self.sources.push((source.clone(), table.clone()));

        tracing::debug!(
            "Wrote {} rows to {}",
            table.row_count(),
            source.to_a1_string()
        );
        Ok(source)
    }

    fn write_label(&mut self, sheet: &str, cell: CellAddress, text: &str) -> SinkResult<()> {
        self.sheet_mut(sheet, cell)?.set(cell, Value::string(text));
        Ok(())
    }

    fn render_pivot(&mut self, request: &PivotRequest) -> SinkResult<PivotHandle> {
        let pivot_error = |message: String| SinkError::Pivot {
            name: request.name.clone(),
            message,
        };

        let table = self
            .source(&request.source)
            .ok_or_else(|| SinkError::UnknownSource(request.source.to_a1_string()))?;
        if request.captions.len() != request.hierarchy.len() {
            return Err(pivot_error(format!(
                "{} captions for {} row fields",
                request.captions.len(),
                request.hierarchy.len()
            )));
        }

        let rollup = match request.measure_kind {
            MeasureKind::Count => table
                .column_index(&request.measure_column)
                .and_then(|_| RollupIndex::count_rows(table, &request.hierarchy)),
            MeasureKind::DistinctCount if !self.capabilities.distinct_count => {
                return Err(pivot_error("distinct count is not available".to_string()));
            }
            MeasureKind::DistinctCount => {
                RollupIndex::distinct_count(table, &request.hierarchy, &request.measure_column)
            }
        }
        .map_err(|e| pivot_error(e.to_string()))?;

        let lines = Self::pivot_lines(request, &rollup);
        let range = block_range(request.destination, lines.len(), 2)
            .map_err(|e| pivot_error(e.to_string()))?;
        if let Some((source, _)) = self
            .sources
            .iter()
            .find(|(s, _)| s.sheet == request.destination_sheet && s.range.overlaps(&range))
        {
            return Err(pivot_error(format!(
                "{}!{} overlaps {}",
                request.destination_sheet,
                range,
                source.to_a1_string()
            )));
        }

        let origin = request.destination;
        let target = self.sheet_mut(&request.destination_sheet, origin)?;
        for (row, line) in lines.into_iter().enumerate() {
            for (col, value) in line.into_iter().enumerate() {
                target.set(
                    CellAddress::new(origin.row + row as u32, origin.col + col as u16),
                    value,
                );
            }
        }

        let handle = PivotHandle {
            name: request.name.clone(),
            sheet: request.destination_sheet.clone(),
            range,
            grand_total: rollup.grand_total(),
        };
        self.pivots.retain(|p| p.handle.name != handle.name);
        self.pivots.push(PivotRecord {
            handle: handle.clone(),
            source: request.source.clone(),
            measure_kind: request.measure_kind,
            measure_column: request.measure_column.clone(),
        });

        tracing::debug!(
            "Rendered pivot {} at {}!{} ({:?})",
            handle.name,
            handle.sheet,
            handle.range,
            request.measure_kind
        );
        Ok(handle)
    }

    fn save(&mut self, path: &Path) -> SinkResult<PathBuf> {
        let save_error = |message: String| SinkError::Save {
            path: path.to_path_buf(),
            message,
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("json") => {
                let mut writer = BufWriter::new(File::create(path)?);
                serde_json::to_writer_pretty(&mut writer, &self.snapshot())
                    .map_err(|e| save_error(e.to_string()))?;
                writer.flush()?;
            }
            Some("csv") => {
                let sheet = self
                    .report_sheet()
                    .ok_or_else(|| save_error("no sheets to save".to_string()))?;
                let records = sheet
                    .grid()
                    .into_iter()
                    .map(|row| row.into_iter().map(|v| v.to_string()));
                CsvWriter::write_records(records, File::create(path)?, &CsvWriteOptions::default())
                    .map_err(|e| save_error(e.to_string()))?;
            }
            _ => {
                return Err(save_error(format!(
                    "unsupported report format: {}",
                    path.display()
                )))
            }
        }

        tracing::debug!("Saved {} sheets to {}", self.sheets.len(), path.display());
        Ok(path.to_path_buf())
    }
}

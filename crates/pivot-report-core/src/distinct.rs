//! Deduplicated pivot sources
//!
//! When no distinct-count aggregation is available, a plain count over a
//! table deduplicated on (month, identity, name, category) gives the same
//! per-group distinct identity counts. [`build_distinct_source`] produces that
//! table together with its rollup.

use ahash::AHashSet;

use crate::error::{Error, Result};
use crate::rollup::RollupIndex;
use crate::table::{Row, Table};

/// A deduplicated table and its rollup counts
#[derive(Debug, Clone)]
pub struct DistinctSource {
    table: Table,
    rollup: RollupIndex,
    first_seen: Vec<usize>,
}

impl DistinctSource {
    /// The deduplicated table (schema = key columns, first-seen row order)
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Counts over the key columns, outermost first
    pub fn rollup(&self) -> &RollupIndex {
        &self.rollup
    }

    /// For each deduplicated row, the index of the input row it came from
    pub fn first_seen(&self) -> &[usize] {
        &self.first_seen
    }

    /// Number of distinct key tuples
    pub fn distinct_count(&self) -> usize {
        self.table.row_count()
    }

    /// Split into the table and rollup
    pub fn into_parts(self) -> (Table, RollupIndex) {
        (self.table, self.rollup)
    }
}

/// Deduplicate `table` on `key_columns` and roll up the distinct tuples
///
/// Rows are projected onto `key_columns` in the given order; the first row
/// carrying each tuple is kept and later duplicates are skipped. The rollup
/// is keyed by `key_columns` in the same order.
///
/// # Errors
///
/// - [`Error::NoKeyColumns`] if `key_columns` is empty
/// - [`Error::Schema`] if a key column is missing
/// - [`Error::EmptyInput`] if `table` has no rows
pub fn build_distinct_source<S: AsRef<str>>(
    table: &Table,
    key_columns: &[S],
) -> Result<DistinctSource> {
    if key_columns.is_empty() {
        return Err(Error::NoKeyColumns);
    }
    let indices = table.column_indices(key_columns)?;
    if table.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut distinct = Table::new(key_columns.iter().map(|c| c.as_ref().to_string()))?;
    let mut first_seen = Vec::new();
    let mut seen = AHashSet::with_capacity(table.row_count());

    for (row_idx, row) in table.rows().iter().enumerate() {
        let tuple = row.project(&indices).ok_or(Error::RowWidth {
            expected: table.column_count(),
            actual: row.len(),
        })?;
        if !seen.insert(tuple.clone()) {
            continue;
        }
        distinct.push_row(Row::new(tuple))?;
        first_seen.push(row_idx);
    }

    let rollup = RollupIndex::count_rows(&distinct, key_columns)?;

    tracing::debug!(
        "Deduplicated {} rows to {} distinct tuples over {:?}",
        table.row_count(),
        distinct.row_count(),
        distinct.columns()
    );

    Ok(DistinctSource {
        table: distinct,
        rollup,
        first_seen,
    })
}

//! Table and row types

use crate::error::{Error, Result};
use crate::value::Value;

/// A row of values, positionally aligned to its table's schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row(Vec<Value>);

impl Row {
    /// Create a row from values
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Values in schema order
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Get the value at a column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the row has no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project onto the given column indices, in order
    ///
    /// Returns `None` if any index is out of range.
    pub fn project(&self, indices: &[usize]) -> Option<Vec<Value>> {
        indices.iter().map(|&i| self.0.get(i).cloned()).collect()
    }

    pub(crate) fn set(&mut self, index: usize, value: Value) {
        self.0[index] = value;
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.0.push(value);
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// An ordered set of rows sharing one schema
///
/// Every row holds exactly one value per schema column; pushing a row of the
/// wrong width is rejected, so the invariant holds structurally.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTable"))]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Unchecked wire form of a [`Table`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::from_rows(raw.columns, raw.rows)
    }
}

impl Table {
    /// Create an empty table with the given schema
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for name in columns {
            table.push_column_name(name.into())?;
        }
        Ok(table)
    }

    /// Build a table from a schema and rows, checking every row's width
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Column names in schema order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Index of a column, or a schema error
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::missing_column(name))
    }

    /// Indices of several columns, in the given order
    pub fn column_indices<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect()
    }

    /// Append a row
    pub fn push_row<R: Into<Row>>(&mut self, row: R) -> Result<()> {
        let row = row.into();
        if row.len() != self.columns.len() {
            return Err(Error::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Get a value by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Result<Option<&Value>> {
        let col = self.column_index(column)?;
        Ok(self.rows.get(row).and_then(|r| r.get(col)))
    }

    /// Values of one column, in row order
    pub fn column_values(&self, column: &str) -> Result<impl Iterator<Item = &Value>> {
        let col = self.column_index(column)?;
        Ok(self.rows.iter().map(move |r| &r.0[col]))
    }

    /// Append a column, filling every existing row with `fill`
    pub fn add_column<S: Into<String>>(&mut self, name: S, fill: Value) -> Result<usize> {
        let index = self.push_column_name(name.into())?;
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        Ok(index)
    }

    /// Index of `name`, appending it (filled with null) if absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        match self.columns.iter().position(|c| c == name) {
            Some(index) => index,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
                self.columns.len() - 1
            }
        }
    }

    /// Mutable access to all rows
    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// A new table holding only the named columns, in the given order
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let indices = self.column_indices(columns)?;
        let mut projected = Table::new(columns.iter().map(|c| c.as_ref().to_string()))?;
        for row in &self.rows {
            let values = row.project(&indices).ok_or(Error::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            })?;
            projected.rows.push(Row::new(values));
        }
        Ok(projected)
    }

    fn push_column_name(&mut self, name: String) -> Result<usize> {
        if self.has_column(&name) {
            return Err(Error::DuplicateColumn(name));
        }
        self.columns.push(name);
        Ok(self.columns.len() - 1)
    }
}

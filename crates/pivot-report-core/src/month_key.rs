//! Month-key derivation
//!
//! Buckets a date-bearing column into `MMM-yyyy` keys (`"Jan-2025"`). Values
//! that are null, blank, unparseable or equal to the minimum-date sentinel get
//! an empty key; unparseable values are reported back as diagnostics instead
//! of failing the run.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Result;
use crate::table::Table;
use crate::value::Value;

/// `chrono` format of a month key
pub const MONTH_KEY_FORMAT: &str = "%b-%Y";

/// Date-time formats tried, in order, on textual values
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only formats tried, in order, on textual values
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
];

/// A value in the date column that could not be read as a date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseFailure {
    /// Row index in the input table
    pub row: usize,
    /// Textual form of the offending value
    pub text: String,
}

/// What happened to the date column while deriving keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthKeyDiagnostics {
    /// Null, blank or sentinel dates (empty key, expected)
    pub null_dates: usize,
    /// Values that were present but not a usable date (empty key, suspicious)
    pub parse_failures: Vec<DateParseFailure>,
}

impl MonthKeyDiagnostics {
    /// Number of unparseable values
    pub fn failure_count(&self) -> usize {
        self.parse_failures.len()
    }

    /// True when every non-null date produced a key
    pub fn is_clean(&self) -> bool {
        self.parse_failures.is_empty()
    }
}

/// Result of [`derive_month_key`]
#[derive(Debug, Clone)]
pub struct MonthKeyOutput {
    /// Input table with the month column populated
    pub table: Table,
    /// Null and parse-failure accounting
    pub diagnostics: MonthKeyDiagnostics,
}

/// Outcome of reading one date cell
#[derive(Debug, Clone, PartialEq, Eq)]
enum DateCell {
    Date(NaiveDateTime),
    Null,
    Unparseable,
}

/// Populate `output_column` with the month key of `date_column`
///
/// The output column is appended when absent and overwritten when present.
/// Row order and row count are preserved; an empty table is returned as is
/// (with the output column added).
///
/// # Errors
///
/// Returns [`Error::Schema`](crate::Error::Schema) if `date_column` is not in
/// the schema.
pub fn derive_month_key(
    mut table: Table,
    date_column: &str,
    output_column: &str,
) -> Result<MonthKeyOutput> {
    let date_idx = table.column_index(date_column)?;
    let out_idx = table.ensure_column(output_column);
    let mut diagnostics = MonthKeyDiagnostics::default();

    for (row_idx, row) in table.rows_mut().iter_mut().enumerate() {
        let raw = row.get(date_idx).cloned().unwrap_or(Value::Null);
        let key = match read_date(&raw) {
            DateCell::Date(dt) => format_month_key(dt),
            DateCell::Null => {
                diagnostics.null_dates += 1;
                String::new()
            }
            DateCell::Unparseable => {
                diagnostics.parse_failures.push(DateParseFailure {
                    row: row_idx,
                    text: raw.to_string(),
                });
                String::new()
            }
        };
        row.set(out_idx, Value::String(key));
    }

    if !diagnostics.is_clean() {
        tracing::warn!(
            "{} value(s) in column '{}' are not dates; their month key is empty",
            diagnostics.failure_count(),
            date_column
        );
    }
    tracing::debug!(
        "Derived '{}' for {} rows ({} null dates)",
        output_column,
        table.row_count(),
        diagnostics.null_dates
    );

    Ok(MonthKeyOutput { table, diagnostics })
}

/// Format a date as a month key, e.g. `Jan-2025`
pub fn format_month_key(dt: NaiveDateTime) -> String {
    dt.format(MONTH_KEY_FORMAT).to_string()
}

/// Parse a textual date with the fixed, locale-free format list
///
/// Accepts RFC 3339, ISO 8601 dates and date-times, `yyyy/mm/dd`, US
/// `mm/dd/yyyy` (with optional time), `d MMM yyyy`, `MMM d, yyyy` and month
/// keys (`Jan-2025`, `January 2025`), which resolve to the first of the month.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    // Month keys and "Month yyyy"
    let first_of_month = [
        (format!("1-{}", text), "%d-%b-%Y"),
        (format!("1 {}", text), "%d %B %Y"),
    ];
    first_of_month
        .iter()
        .find_map(|(candidate, fmt)| NaiveDate::parse_from_str(candidate, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// True for `MMM-yyyy` keys such as `Jan-2025`
pub fn is_month_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 8
        && bytes[0].is_ascii_uppercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2].is_ascii_lowercase()
        && bytes[3] == b'-'
        && bytes[4..].iter().all(|b| b.is_ascii_digit())
}

fn read_date(raw: &Value) -> DateCell {
    let dt = match raw {
        Value::Null => return DateCell::Null,
        Value::String(s) if s.trim().is_empty() => return DateCell::Null,
        Value::DateTime(dt) => *dt,
        other => match parse_date_text(&other.to_string()) {
            Some(dt) => dt,
            None => return DateCell::Unparseable,
        },
    };

    if is_min_sentinel(dt) {
        DateCell::Null
    } else if !(1..=9999).contains(&dt.year()) {
        DateCell::Unparseable
    } else {
        DateCell::Date(dt)
    }
}

/// `0001-01-01T00:00:00` stands for "no date"
fn is_min_sentinel(dt: NaiveDateTime) -> bool {
    dt.year() == 1 && dt.ordinal() == 1 && dt.time() == NaiveTime::MIN
}

//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use pivot_report_core::{parse_date_text, Table, Value};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;

/// How a column's fields are turned into values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Detect,
    Text,
    Date,
}

/// CSV table reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a table
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Table> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!("Reading CSV table from {}", path.display());
        Self::read(file, options)
    }

    /// Read CSV from a reader into a table
    ///
    /// Every record must have as many fields as the header (or, without a
    /// header, as the first record).
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.records() {
            records.push(result?);
        }

        let columns: Vec<String> = if options.has_header {
            csv_reader
                .headers()?
                .iter()
                .map(|h| h.trim().to_string())
                .collect()
        } else {
            let width = records.first().map_or(0, |r| r.len());
            (1..=width).map(|i| format!("Column{i}")).collect()
        };

        let kinds: Vec<FieldKind> = columns
            .iter()
            .map(|name| Self::field_kind(name, options))
            .collect();
        let mut table = Table::new(columns)?;

        for record in &records {
            if record.len() != kinds.len() {
                let line = record.position().map_or(0, |p| p.line());
                return Err(CsvError::Parse {
                    line,
                    message: format!(
                        "expected {} fields, found {}",
                        kinds.len(),
                        record.len()
                    ),
                });
            }

            let row: Vec<Value> = record
                .iter()
                .zip(&kinds)
                .map(|(field, &kind)| Self::convert(field, kind, options.auto_detect_types))
                .collect();
            table.push_row(row)?;
        }

        tracing::debug!(
            "Read {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }

    fn field_kind(name: &str, options: &CsvReadOptions) -> FieldKind {
        if options.text_columns.iter().any(|c| c == name) {
            FieldKind::Text
        } else if options.date_columns.iter().any(|c| c == name) {
            FieldKind::Date
        } else {
            FieldKind::Detect
        }
    }

    fn convert(field: &str, kind: FieldKind, auto_detect: bool) -> Value {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }

        match kind {
            FieldKind::Text => Value::string(field),
            // Unparseable dates stay text so the month key can report them
            FieldKind::Date => parse_date_text(trimmed)
                .map(Value::DateTime)
                .unwrap_or_else(|| Value::string(field)),
            FieldKind::Detect if auto_detect => Self::detect_type(trimmed),
            FieldKind::Detect => Value::string(field),
        }
    }

    /// Detect the type of a non-empty field
    fn detect_type(field: &str) -> Value {
        if let Ok(n) = field.parse::<i64>() {
            return Value::Integer(n);
        }

        // f64 parsing also accepts "inf" and "NaN", which are names here
        let numeric = field
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        if numeric && field.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(n) = field.parse::<f64>() {
                return Value::Float(n);
            }
        }

        Value::string(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(input: &str, options: &CsvReadOptions) -> CsvResult<Table> {
        CsvReader::read(input.as_bytes(), options)
    }

    #[test]
    fn test_header_and_type_detection() {
        let table = read(
            "ApplicationID,Score,Weight,ApplicationName\nApp1,3,2.5,Alpha\nApp2,,1e3,inf\n",
            &CsvReadOptions::default(),
        )
        .unwrap();

        assert_eq!(
            table.columns(),
            ["ApplicationID", "Score", "Weight", "ApplicationName"]
        );
        assert_eq!(table.rows()[0].values()[1], Value::Integer(3));
        assert_eq!(table.rows()[0].values()[2], Value::Float(2.5));
        assert_eq!(table.rows()[1].values()[1], Value::Null);
        assert_eq!(table.rows()[1].values()[2], Value::Float(1000.0));
        assert_eq!(table.rows()[1].values()[3], Value::from("inf"));
    }

    #[test]
    fn test_date_and_text_columns() {
        let options = CsvReadOptions::default()
            .with_date_column("AppliedOn")
            .with_text_column("ApplicationID");
        let table = read(
            "ApplicationID,AppliedOn\n007,2025-01-02\n008,someday\n009,\n",
            &options,
        )
        .unwrap();

        assert_eq!(table.rows()[0].values()[0], Value::from("007"));
        assert_eq!(table.rows()[0].values()[1], Value::date(2025, 1, 2));
        assert_eq!(table.rows()[1].values()[1], Value::from("someday"));
        assert_eq!(table.rows()[2].values()[1], Value::Null);
    }

    #[test]
    fn test_no_header_names_columns() {
        let options = CsvReadOptions {
            has_header: false,
            auto_detect_types: false,
            ..Default::default()
        };
        let table = read("a,1\nb,2\n", &options).unwrap();
        assert_eq!(table.columns(), ["Column1", "Column2"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1].values()[1], Value::from("2"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let options = CsvReadOptions {
            delimiter: b';',
            ..Default::default()
        };
        let table = read("Name;Category\n\"Alpha; Inc\";Finance\n", &options).unwrap();
        assert_eq!(table.rows()[0].values()[0], Value::from("Alpha; Inc"));
    }

    #[test]
    fn test_ragged_record_is_rejected() {
        let err = read("A,B\n1,2\n3\n", &CsvReadOptions::default()).unwrap_err();
        match err {
            CsvError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_header_is_rejected() {
        let err = read("A,A\n1,2\n", &CsvReadOptions::default()).unwrap_err();
        assert!(matches!(err, CsvError::Core(_)));
    }

    #[test]
    fn test_header_only_input() {
        let table = read("A,B\n", &CsvReadOptions::default()).unwrap();
        assert_eq!(table.column_count(), 2);
        assert!(table.is_empty());
    }
}

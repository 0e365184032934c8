//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use pivot_report_core::{Table, Value};

use crate::error::CsvResult;
use crate::options::CsvWriteOptions;

/// CSV table writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a table to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        table: &Table,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(table, file, options)
    }

    /// Write a table to a writer, header row first
    pub fn write<W: Write>(table: &Table, writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        let mut csv_writer = Self::builder(options).from_writer(writer);

        if options.write_header {
            csv_writer.write_record(table.columns())?;
        }
        for row in table.rows() {
            csv_writer.write_record(row.values().iter().map(Value::to_string))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write raw string records (e.g. a rendered sheet grid)
    pub fn write_records<W, I, R>(records: I, writer: W, options: &CsvWriteOptions) -> CsvResult<()>
    where
        W: Write,
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let mut csv_writer = Self::builder(options).from_writer(writer);
        for record in records {
            csv_writer.write_record(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn builder(options: &CsvWriteOptions) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(options.line_terminator.to_csv())
            .flexible(true);
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LineTerminator;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn lf() -> CsvWriteOptions {
        CsvWriteOptions {
            line_terminator: LineTerminator::LF,
            ..Default::default()
        }
    }

    fn write(table: &Table, options: &CsvWriteOptions) -> String {
        let mut out = Vec::new();
        CsvWriter::write(table, &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_table() {
        let noon = NaiveDate::from_ymd_opt(2025, 1, 8)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let table = Table::from_rows(
            ["ID", "AppliedOn", "Name"],
            vec![
                vec!["App1".into(), Value::date(2025, 1, 2), "Alpha, Inc".into()],
                vec![Value::Integer(2), noon.into(), Value::Null],
            ],
        )
        .unwrap();

        assert_eq!(
            write(&table, &lf()),
            "ID,AppliedOn,Name\nApp1,2025-01-02,\"Alpha, Inc\"\n2,2025-01-08 12:30:00,\n"
        );
    }

    #[test]
    fn test_write_without_header_crlf() {
        let table = Table::from_rows(["A"], vec![vec!["x".into()]]).unwrap();
        let options = CsvWriteOptions {
            write_header: false,
            ..Default::default()
        };
        assert_eq!(write(&table, &options), "x\r\n");
    }

    #[test]
    fn test_write_ragged_records() {
        let mut out = Vec::new();
        let records = vec![vec!["Title"], vec!["Month", "Count"]];
        CsvWriter::write_records(records, &mut out, &lf()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Title\nMonth,Count\n");
    }
}

//! End-to-end tests for the report pipeline over the memory sink

use pivot_report::prelude::*;
use pivot_report::{MeasureKind, PivotStrategy};
use pretty_assertions::assert_eq;

fn applications() -> Table {
    Table::from_rows(
        ["ApplicationID", "AppliedOn", "ApplicationName", "Category"],
        vec![
            vec!["App1".into(), Value::date(2025, 1, 2), "Alpha".into(), "Finance".into()],
            vec!["App2".into(), Value::date(2025, 1, 8), "Beta".into(), "Retail".into()],
            vec!["App1".into(), Value::date(2025, 1, 20), "Alpha".into(), "Finance".into()],
            vec!["App3".into(), "2025-02-03".into(), "Gamma".into(), "HR".into()],
            vec!["App4".into(), Value::Null, "Delta".into(), "HR".into()],
        ],
    )
    .unwrap()
}

fn text(sink: &MemorySink, sheet: &str, cell: &str) -> String {
    sink.sheet(sheet)
        .and_then(|s| s.value(cell))
        .map(Value::to_string)
        .unwrap_or_default()
}

fn report_path() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    (dir, path)
}

/// Auto picks the distinct-count measure when the sink offers it
#[test]
fn test_auto_uses_distinct_count() {
    let (_dir, path) = report_path();
    let mut sink = MemorySink::new();
    let outcome = run_report(applications(), &ReportConfig::default(), &mut sink, &path).unwrap();

    assert_eq!(outcome.strategy, PivotStrategy::DistinctCount);
    assert_eq!(outcome.path, path);
    assert_eq!(outcome.diagnostics.null_dates, 1);
    assert_eq!(sink.sheet_names(), vec!["Data", "Report"]);
    assert_eq!(sink.pivots()[0].measure_kind, MeasureKind::DistinctCount);

    assert_eq!(text(&sink, "Report", "A5"), "Monthly Application Onboarding Report");
    assert_eq!(text(&sink, "Report", "A7"), "Application Month");
    assert_eq!(text(&sink, "Report", "B7"), "Distinct Applications");
    assert_eq!(text(&sink, "Report", "A8"), "Jan-2025");
    assert_eq!(text(&sink, "Report", "B8"), "2");
    assert_eq!(text(&sink, "Report", "A9"), "  Alpha");
    assert_eq!(text(&sink, "Report", "A10"), "    Finance");
    assert_eq!(text(&sink, "Report", "A16"), "(blank)");
    assert_eq!(text(&sink, "Report", "A19"), "Grand Total");
    assert_eq!(text(&sink, "Report", "B19"), "4");

    // Footer two rows below the pivot's last row
    assert_eq!(outcome.pivot.range.to_a1_string(), "A7:B19");
    assert_eq!(text(&sink, "Report", "A21"), "Internal");
    assert!(path.exists());
}

/// Without distinct count the deduplicated source feeds a plain count
#[test]
fn test_auto_falls_back_to_deduplicated_source() {
    let (_dir, path) = report_path();
    let mut distinct_sink = MemorySink::new();
    run_report(
        applications(),
        &ReportConfig::default(),
        &mut distinct_sink,
        &path,
    )
    .unwrap();

    let mut sink = MemorySink::with_capabilities(SinkCapabilities::default());
    let outcome = run_report(applications(), &ReportConfig::default(), &mut sink, &path).unwrap();

    assert_eq!(outcome.strategy, PivotStrategy::Deduplicated);
    assert_eq!(sink.sheet_names(), vec!["Data", "PivotSource", "Report"]);

    let record = &sink.pivots()[0];
    assert_eq!(record.measure_kind, MeasureKind::Count);
    assert_eq!(record.source.to_a1_string(), "PivotSource!A3:D7");
    assert_eq!(text(&sink, "PivotSource", "A3"), "ApplicationMonth");
    assert_eq!(text(&sink, "PivotSource", "B4"), "App1");

    // Same numbers either way for this data
    assert_eq!(
        sink.sheet("Report").unwrap().grid(),
        distinct_sink.sheet("Report").unwrap().grid()
    );
}

#[test]
fn test_data_sheet_carries_month_column() {
    let (_dir, path) = report_path();
    let mut sink = MemorySink::new();
    run_report(applications(), &ReportConfig::default(), &mut sink, &path).unwrap();

    assert_eq!(text(&sink, "Data", "A3"), "ApplicationID");
    assert_eq!(text(&sink, "Data", "E3"), "ApplicationMonth");
    assert_eq!(text(&sink, "Data", "B4"), "2025-01-02");
    assert_eq!(text(&sink, "Data", "E4"), "Jan-2025");
    assert_eq!(text(&sink, "Data", "E7"), "Feb-2025");
    assert_eq!(text(&sink, "Data", "E8"), "");
}

/// Forced distinct count on an incapable sink fails before any write
#[test]
fn test_unsupported_strategy_touches_nothing() {
    let (_dir, path) = report_path();
    let config = ReportConfig {
        strategy: PivotStrategy::DistinctCount,
        ..Default::default()
    };
    let mut sink = MemorySink::with_capabilities(SinkCapabilities::default());
    let err = run_report(applications(), &config, &mut sink, &path).unwrap_err();

    assert!(matches!(err, Error::Unsupported(_)));
    assert!(sink.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_empty_input_touches_nothing() {
    let (_dir, path) = report_path();
    let empty = Table::new(["ApplicationID", "AppliedOn", "ApplicationName", "Category"]).unwrap();
    let mut sink = MemorySink::new();
    let err = run_report(empty, &ReportConfig::default(), &mut sink, &path).unwrap_err();

    assert!(matches!(err, Error::EmptyInput));
    assert!(sink.is_empty());
}

#[test]
fn test_missing_column_touches_nothing() {
    let (_dir, path) = report_path();
    let table = applications().project(&["ApplicationID", "AppliedOn", "ApplicationName"]);
    let mut sink = MemorySink::new();
    let err = run_report(table.unwrap(), &ReportConfig::default(), &mut sink, &path).unwrap_err();

    assert!(matches!(err, Error::Schema { column } if column == "Category"));
    assert!(sink.is_empty());
}

/// A footer that would fall off the sheet is rejected before any write
#[test]
fn test_footer_past_last_row_touches_nothing() {
    let (_dir, path) = report_path();
    let config = ReportConfig {
        footer_gap: 2_000_000,
        ..Default::default()
    };
    let mut sink = MemorySink::new();
    let err = run_report(applications(), &config, &mut sink, &path).unwrap_err();

    assert!(matches!(err, Error::InvalidAddress(_)));
    assert!(sink.is_empty());
    assert!(sink.pivots().is_empty());
}

/// A pivot too tall for the rows left below its cell is rejected up front
#[test]
fn test_pivot_past_last_row_touches_nothing() {
    let (_dir, path) = report_path();
    let config = ReportConfig {
        pivot_cell: format!("A{}", pivot_report::MAX_ROWS - 5),
        ..Default::default()
    };
    let mut sink = MemorySink::new();
    let err = run_report(applications(), &config, &mut sink, &path).unwrap_err();

    assert!(matches!(err, Error::InvalidAddress(_)));
    assert!(sink.is_empty());
}

#[test]
fn test_deserialized_table_keeps_its_shape() {
    let ragged = r#"{"columns":["ApplicationID","Category"],"rows":[[{"String":"App1"}]]}"#;
    assert!(serde_json::from_str::<Table>(ragged).is_err());

    let table: Table = serde_json::from_str(
        r#"{"columns":["ApplicationID","Category"],"rows":[[{"String":"App1"},"Null"]]}"#,
    )
    .unwrap();
    let source = pivot_report::build_distinct_source(&table, &["ApplicationID", "Category"]);
    assert_eq!(source.unwrap().distinct_count(), 1);
}

/// Distinct subtotals count an identity once even across row fields
#[test]
fn test_distinct_subtotals_are_not_sums() {
    let table = Table::from_rows(
        ["ApplicationID", "AppliedOn", "ApplicationName", "Category"],
        vec![
            vec!["App1".into(), Value::date(2025, 3, 1), "Alpha".into(), "Finance".into()],
            vec!["App1".into(), Value::date(2025, 3, 9), "Alpha v2".into(), "Finance".into()],
        ],
    )
    .unwrap();
    let prepared = prepare(table, &ReportConfig::default()).unwrap();
    let march = [Value::from("Mar-2025")];

    assert_eq!(
        prepared
            .rollup_for(PivotStrategy::DistinctCount)
            .count_at(&march),
        Some(1)
    );
    assert_eq!(
        prepared
            .rollup_for(PivotStrategy::Deduplicated)
            .count_at(&march),
        Some(2)
    );
}

#[test]
fn test_config_from_json() {
    let (_dir, path) = report_path();
    let config: ReportConfig = serde_json::from_str(
        r#"{ "pivot_cell": "C10", "footer": null, "title": "Q1", "strategy": "deduplicated" }"#,
    )
    .unwrap();
    assert_eq!(config.date_column, "AppliedOn");

    let mut sink = MemorySink::new();
    let outcome = run_report(applications(), &config, &mut sink, &path).unwrap();

    assert_eq!(outcome.strategy, PivotStrategy::Deduplicated);
    assert_eq!(outcome.pivot.range.to_a1_string(), "C10:D22");
    assert_eq!(text(&sink, "Report", "A5"), "Q1");
    assert_eq!(text(&sink, "Report", "C24"), "");
}

#[test]
fn test_saved_snapshot_lists_sheets() {
    let (_dir, path) = report_path();
    let mut sink = MemorySink::new();
    run_report(applications(), &ReportConfig::default(), &mut sink, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let names: Vec<&str> = json["sheets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Data", "Report"]);
    assert_eq!(json["pivots"][0]["handle"]["name"], "MonthlyPivot");
}

#[test]
fn test_csv_input_to_csv_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("applications.csv");
    std::fs::write(
        &input,
        "ApplicationID,AppliedOn,ApplicationName,Category\n\
         App1,01/02/2025,Alpha,Finance\n\
         App2,01/08/2025,Beta,Retail\n\
         App1,01/20/2025,Alpha,Finance\n",
    )
    .unwrap();

    let options = CsvReadOptions::default()
        .with_date_column("AppliedOn")
        .with_text_column("ApplicationID");
    let table = CsvReader::read_file(&input, &options).unwrap();

    let output = dir.path().join("report.csv");
    let mut sink = MemorySink::new();
    run_report(table, &ReportConfig::default(), &mut sink, &output).unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[6], "Application Month,Distinct Applications");
    assert_eq!(lines[7], "Jan-2025,2");
    assert_eq!(lines[12], "Grand Total,2");
    assert_eq!(lines[14], "Internal,");
}

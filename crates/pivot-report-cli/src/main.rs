//! pivot-report CLI - monthly distinct-count pivot reports from CSV

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use pivot_report::prelude::*;
use pivot_report::{MonthKeyDiagnostics, PreparedReport, RollupNode, BLANK_LABEL};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// File name timestamp, as in `Report_20250131_094500.json`
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Parse failures listed by `preview` before eliding the rest
const PREVIEW_FAILURES: usize = 10;

#[derive(Parser)]
#[command(name = "pivot-report")]
#[command(author, version, about = "Monthly distinct-count pivot reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report from a CSV file and save it
    Build {
        /// Input CSV file
        input: PathBuf,

        /// Directory receiving the report (created if missing)
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Base file name; a timestamp and extension are appended
        #[arg(short, long, default_value = "Monthly Application Onboarding Report")]
        name: String,

        /// JSON report configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pivot strategy (overrides the configuration)
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Timestamp for the file name (YYYYMMDD_HHMMSS, default: now)
        #[arg(long)]
        timestamp: Option<String>,

        /// Field delimiter of the input
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Treat the sink as lacking distinct-count aggregation
        #[arg(long)]
        no_distinct_count: bool,
    },

    /// Print the rollup a report would show, without saving anything
    Preview {
        /// Input CSV file
        input: PathBuf,

        /// JSON report configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Field delimiter of the input
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    DistinctCount,
    Deduplicated,
}

impl From<StrategyArg> for PivotStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => PivotStrategy::Auto,
            StrategyArg::DistinctCount => PivotStrategy::DistinctCount,
            StrategyArg::Deduplicated => PivotStrategy::Deduplicated,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output_dir,
            name,
            config,
            strategy,
            format,
            timestamp,
            delimiter,
            no_distinct_count,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(strategy) = strategy {
                config.strategy = strategy.into();
            }
            let timestamp = match timestamp {
                Some(ts) => validate_timestamp(&ts)?,
                None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
            };
            let capabilities = SinkCapabilities {
                distinct_count: !no_distinct_count,
            };
            build(
                &input,
                &output_dir,
                &name,
                &config,
                format,
                &timestamp,
                delimiter,
                capabilities,
            )
        }
        Commands::Preview {
            input,
            config,
            delimiter,
        } => {
            let config = load_config(config.as_deref())?;
            preview(&input, &config, delimiter)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    let Some(path) = path else {
        return Ok(ReportConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config '{}'", path.display()))
}

fn validate_timestamp(ts: &str) -> Result<String> {
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid timestamp '{}', expected YYYYMMDD_HHMMSS", ts))?;
    Ok(ts.to_string())
}

fn report_path(dir: &Path, name: &str, timestamp: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", name, timestamp, format.extension()))
}

fn read_input(input: &Path, config: &ReportConfig, delimiter: char) -> Result<Table> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be an ASCII character, got '{}'", delimiter);
    }
    let options = CsvReadOptions {
        delimiter: delimiter as u8,
        ..Default::default()
    }
    .with_date_column(config.date_column.as_str())
    .with_text_column(config.id_column.as_str());

    let table = CsvReader::read_file(input, &options)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    tracing::info!("Read {} rows from {}", table.row_count(), input.display());
    Ok(table)
}

#[allow(clippy::too_many_arguments)]
fn build(
    input: &Path,
    output_dir: &Path,
    name: &str,
    config: &ReportConfig,
    format: OutputFormat,
    timestamp: &str,
    delimiter: char,
    capabilities: SinkCapabilities,
) -> Result<()> {
    let table = read_input(input, config, delimiter)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create '{}'", output_dir.display()))?;
    let path = report_path(output_dir, name, timestamp, format);

    let mut sink = MemorySink::with_capabilities(capabilities);
    let outcome = run_report(table, config, &mut sink, &path).context("Failed to build report")?;

    if !outcome.diagnostics.is_clean() {
        eprintln!(
            "Warning: {} dates could not be parsed; their rows have an empty month",
            outcome.diagnostics.failure_count()
        );
    }
    println!("{}", outcome.path.display());
    Ok(())
}

fn preview(input: &Path, config: &ReportConfig, delimiter: char) -> Result<()> {
    let table = read_input(input, config, delimiter)?;
    let rows = table.row_count();
    let prepared = prepare(table, config).context("Failed to prepare report")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "File: {}", input.display())
        .and_then(|()| write_preview(&mut out, rows, &prepared, config))
        .context("Failed to write to stdout")
}

/// Row counts, date diagnostics and the rollup tree of a prepared report
fn write_preview<W: Write>(
    out: &mut W,
    rows: usize,
    prepared: &PreparedReport,
    config: &ReportConfig,
) -> io::Result<()> {
    let rollup = prepared.rollup_for(config.strategy);

    writeln!(
        out,
        "Rows: {} ({} distinct on {})",
        rows,
        prepared.distinct.distinct_count(),
        config.key_columns().join(", ")
    )?;
    write_diagnostics(out, &prepared.diagnostics)?;

    writeln!(out)?;
    writeln!(out, "{}\t{}", rollup.levels().join(" / "), config.measure_caption)?;
    write_nodes(out, rollup.root().children(), 0)?;
    writeln!(out, "Grand Total\t{}", rollup.grand_total())
}

fn write_diagnostics<W: Write>(out: &mut W, diagnostics: &MonthKeyDiagnostics) -> io::Result<()> {
    writeln!(out, "Empty dates: {}", diagnostics.null_dates)?;
    writeln!(out, "Unparseable dates: {}", diagnostics.failure_count())?;
    for failure in diagnostics.parse_failures.iter().take(PREVIEW_FAILURES) {
        writeln!(out, "  row {}: {:?}", failure.row, failure.text)?;
    }
    if diagnostics.failure_count() > PREVIEW_FAILURES {
        writeln!(out, "  ...")?;
    }
    Ok(())
}

fn write_nodes<W: Write>(out: &mut W, nodes: &[RollupNode], level: usize) -> io::Result<()> {
    for node in nodes {
        let label = node.value().to_string();
        let label = if label.is_empty() { BLANK_LABEL } else { &label };
        writeln!(out, "{}{}\t{}", "  ".repeat(level), label, node.count())?;
        write_nodes(out, node.children(), level + 1)?;
    }
    Ok(())
}

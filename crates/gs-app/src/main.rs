//! Command-line entry point: resample a CSV file onto a fixed time grid

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gs_core::Row;
use gs_data::sources::parse_timestamp;
use gs_data::{rows_to_record_batch, CsvSource, DrainOutcome, NullConfig, SplinesConfig, Synchronizer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Comma-separated values
    Csv,
    /// Pretty-printed table
    Table,
}

/// Resample irregular time-series columns onto a common grid with splines
#[derive(Debug, Parser)]
#[command(name = "gridsync", version)]
struct Args {
    /// Input CSV file with a header row
    #[arg(short, long)]
    input: PathBuf,
    
    /// First output time (epoch milliseconds or RFC 3339)
    #[arg(long)]
    start: Option<String>,
    
    /// Last output time, inclusive (epoch milliseconds or RFC 3339)
    #[arg(long)]
    end: Option<String>,
    
    /// JSON configuration file; `--start`/`--end` override its bounds
    #[arg(long, conflicts_with = "options")]
    config: Option<PathBuf>,
    
    /// Processor option as key=value (interval, epochOffset, columnsToInterpolate, ...)
    #[arg(short = 'o', long = "option", value_parser = parse_key_value)]
    options: Vec<(String, String)>,
    
    /// Extra cell content to read as "no value" (repeatable)
    #[arg(long = "null", value_name = "MARKER")]
    null_markers: Vec<String>,
    
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
    
    /// Decimal places in the output
    #[arg(long, default_value_t = 6)]
    scale: u32,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    raw.map(|value| parse_timestamp(value).ok_or_else(|| anyhow!("--{} '{}' is not a timestamp", name, value)))
        .transpose()
}

/// Resolve the configuration from a JSON file or from `-o` options
fn load_config(args: &Args) -> Result<SplinesConfig> {
    let start = parse_bound("start", args.start.as_deref())?;
    let end = parse_bound("end", args.end.as_deref())?;
    
    match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {:?}", path))?;
            let mut config = SplinesConfig::from_json(&json)?;
            if let Some(start) = start {
                config.start_time = start;
            }
            if let Some(end) = end {
                config.end_time = end;
            }
            config.validate()?;
            Ok(config)
        }
        None => {
            let options: HashMap<String, String> = args.options.iter().cloned().collect();
            Ok(SplinesConfig::from_options(&options, start, end)?)
        }
    }
}

/// Consecutive `MissingData` results without a new upstream row before giving up
const MAX_STALLED_READS: usize = 100;

/// Drive the synchronizer to the end of its stream.
///
/// Unreadable records are skipped; an upstream that keeps failing without
/// delivering rows is treated as broken.
fn drain(synchronizer: &mut Synchronizer) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let mut stalled = 0;
    loop {
        let rows_in = synchronizer.stats().rows_in;
        let (mut batch, outcome) = synchronizer.collect_rows();
        let progressed = !batch.is_empty() || synchronizer.stats().rows_in > rows_in;
        rows.append(&mut batch);
        
        match outcome {
            DrainOutcome::Finished => return Ok(rows),
            // A file never blocks; pending only repeats the read
            DrainOutcome::Pending => continue,
            DrainOutcome::MissingData(reason) => {
                stalled = if progressed { 0 } else { stalled + 1 };
                if stalled >= MAX_STALLED_READS {
                    bail!("input keeps failing without producing rows: {}", reason);
                }
                warn!("skipping unreadable input: {}", reason);
            }
        }
    }
}

fn write_csv(rows: &[Row], config: &SplinesConfig, scale: u32) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    
    let mut header = vec![config.time_column.as_str()];
    header.extend(config.columns_to_interpolate.iter().map(String::as_str));
    writer.write_record(&header)?;
    
    for row in rows {
        let mut record = vec![row.time(&config.time_column).map(|t| t.to_string()).unwrap_or_default()];
        record.extend(config.columns_to_interpolate.iter().map(|column| {
            row.get(column)
                .map(|value| value.round_dp(scale).normalize().to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_table(rows: &[Row], config: &SplinesConfig, scale: u32) -> Result<()> {
    let batch = rows_to_record_batch(rows, &config.time_column, &config.columns_to_interpolate, scale)?;
    let table = arrow::util::pretty::pretty_format_batches(&[batch])?;
    writeln!(io::stdout(), "{}", table)?;
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    
    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Resampling {:?}", args.input);
    
    let source = CsvSource::open(&args.input, &config.time_column)?
        .with_null_config(NullConfig::with_markers(args.null_markers.iter().cloned()));
    for column in &config.columns_to_interpolate {
        if !source.headers().contains(column) {
            bail!("column '{}' not found in {:?}", column, args.input);
        }
    }
    
    let mut synchronizer = Synchronizer::new(&config, Box::new(source))?;
    let rows = drain(&mut synchronizer)?;
    
    let stats = synchronizer.stats();
    info!("{} rows in, {} rows out", stats.rows_in, stats.rows_out);
    
    match args.format {
        OutputFormat::Csv => write_csv(&rows, &config, args.scale),
        OutputFormat::Table => write_table(&rows, &config, args.scale),
    }
}

// crates/gliderproc/src/main.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gliderproc_core::options::ProcessingOptions;
use gliderproc_core::pipeline::{GliderPipeline, ProcessedDataset};
use gliderproc_core::raw::RawRecord;
use gliderproc_core::timebase::TIME_FIELD;

#[derive(Parser, Debug)]
#[command(author, version, about = "Glider telemetry processing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a raw telemetry matrix into a quality-controlled time series
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Raw telemetry CSV: one header row of channel names, numeric cells,
    /// empty cells or "NaN" for missing samples
    #[arg(long)]
    input: PathBuf,
    /// TOML file with processing options; defaults apply when omitted
    #[arg(long)]
    options: Option<PathBuf>,
    /// Destination CSV for the processed time series
    #[arg(long)]
    output: PathBuf,
    /// Optional JSON processing summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process(args) => run_process(args),
    }
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let options = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read options file {}", path.display()))?;
            toml::from_str::<ProcessingOptions>(&text)
                .with_context(|| format!("failed to parse options file {}", path.display()))?
        }
        None => ProcessingOptions::default(),
    };

    let record = read_raw_csv(&args.input)?;
    info!(
        rows = record.height(),
        channels = record.channel_names().count(),
        "raw record loaded"
    );

    let pipeline = GliderPipeline::new(options);
    let dataset = pipeline.process(&record)?;

    if let Some(halt) = &dataset.halt {
        warn!("nothing processed: {halt}");
        if let Some(path) = &args.summary {
            write_summary(path, &dataset)?;
        }
        return Ok(());
    }

    log_time_span(&dataset)?;
    write_output_csv(&args.output, &dataset)?;
    if let Some(path) = &args.summary {
        write_summary(path, &dataset)?;
    }

    info!(
        rows = dataset.timeseries.len(),
        profiles = dataset.profile_count,
        output = %args.output.display(),
        "processed time series written"
    );
    Ok(())
}

fn read_raw_csv(path: &Path) -> Result<RawRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("raw CSV has no header row")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        bail!("raw CSV {} declares no channels", path.display());
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (row_idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("failed to read row {}", row_idx + 1))?;
        if row.len() != headers.len() {
            bail!(
                "row {} has {} cells, expected {}",
                row_idx + 1,
                row.len(),
                headers.len()
            );
        }
        for (col, cell) in row.iter().enumerate() {
            let trimmed = cell.trim();
            let value = if trimmed.is_empty() {
                f64::NAN
            } else {
                trimmed
                    .parse::<f64>()
                    .with_context(|| format!("row {}: bad numeric cell {trimmed:?}", row_idx + 1))?
            };
            columns[col].push(value);
        }
    }

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    RawRecord::from_columns(
        headers.into_iter().zip(columns).collect(),
        source,
    )
    .context("raw CSV columns are inconsistent")
}

fn write_output_csv(path: &Path, dataset: &ProcessedDataset) -> Result<()> {
    let fields = dataset.timeseries.field_names();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(&fields)?;

    let mut columns = Vec::with_capacity(fields.len());
    for field in &fields {
        columns.push(dataset.timeseries.values(field)?);
    }
    for row in 0..dataset.timeseries.len() {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| {
                let value = col[row];
                if value.is_finite() {
                    format!("{value}")
                } else {
                    String::new()
                }
            })
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

fn log_time_span(dataset: &ProcessedDataset) -> Result<()> {
    let time = dataset.timeseries.values(TIME_FIELD)?;
    let first = time.iter().copied().find(|t| t.is_finite());
    let last = time.iter().rev().copied().find(|t| t.is_finite());
    if let (Some(first), Some(last)) = (first, last) {
        let fmt = |secs: f64| {
            DateTime::from_timestamp(secs as i64, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| format!("{secs}"))
        };
        info!(start = %fmt(first), end = %fmt(last), "record time span");
    }
    Ok(())
}

fn write_summary(path: &Path, dataset: &ProcessedDataset) -> Result<()> {
    let summary = json!({
        "halted": dataset.halt.as_ref().map(|h| h.to_string()),
        "rows": dataset.timeseries.len(),
        "fields": dataset.timeseries.field_names(),
        "profiles": dataset.profile_count,
        "transects": dataset.transects.len(),
        "ctd_available": dataset.availability.ctd,
        "flntu_available": dataset.availability.flntu,
        "oxygen_available": dataset.availability.oxygen,
        "water_currents_available": dataset.availability.water_currents,
        "source": dataset.source,
        "recipe_tokens": dataset
            .recipe
            .tokens()
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>(),
        "recipe_removals": dataset
            .recipe
            .removals()
            .iter()
            .map(|r| json!({ "token": r.token.as_str(), "reason": r.reason }))
            .collect::<Vec<_>>(),
    });
    fs::write(path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write summary {}", path.display()))?;
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use polars::prelude::*;
use tracing_subscriber::EnvFilter;

use sales_report::aggregate::{self, SalesAggregates};
use sales_report::charts::build_charts;
use sales_report::config::{self, Config, OutputFormat, SimpleOutputFormat};
use sales_report::document::{build_report_document, summary_lines};
use sales_report::filter::{FilterCriteria, apply_filter};
use sales_report::pdf::write_pdf;
use sales_report::schema::{self, SalesFrame};
use sales_report::table::read_table;

#[derive(Parser, Debug)]
#[clap(author = "Simon Zeng", version, about = "Sales export reporting tool")]
struct Args {
    /// Path to config.json
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Spreadsheet or CSV to report on, overriding `input` from the config
    #[arg(short, long)]
    input: Option<PathBuf>,
}

/// The selection from the config, falling back to everything in the data.
fn filter_criteria(frame: &SalesFrame, cfg: &Config) -> Result<FilterCriteria> {
    let criteria = FilterCriteria::with_defaults(
        frame,
        cfg.clients.clone(),
        cfg.categories.clone(),
        cfg.start_date,
        cfg.end_date,
    )?;
    Ok(criteria)
}

pub fn run(cfg: &Config) -> Result<()> {
    let table = read_table(&cfg.input).with_context(|| format!("reading {:?}", cfg.input))?;
    let frame = schema::normalize(&table, &cfg.columns, &cfg.locale)
        .context("normalizing sales table")?;
    let criteria = filter_criteria(&frame, cfg).context("building filter")?;
    let filtered = apply_filter(frame, &criteria).context("filtering sales")?;
    let aggregates =
        aggregate::aggregate(&filtered, &cfg.locale).context("aggregating sales")?;

    for line in summary_lines(&aggregates.summary) {
        println!("{}: {}", line.label, line.value);
    }

    match &cfg.output_format {
        OutputFormat::Simple(SimpleOutputFormat::PolarsPrint) => {
            // SAFETY: single-threaded at this point, no concurrent env access
            unsafe { std::env::set_var("POLARS_FMT_MAX_ROWS", "-1") };
            for (name, df) in aggregates.tables()? {
                println!("{name}");
                println!("{df}");
            }
        }
        OutputFormat::Simple(SimpleOutputFormat::CsvPrint) => {
            for (name, mut df) in aggregates.tables()? {
                let csv = write_csv_string(&mut df)?;
                println!("{name}");
                print!("{csv}");
            }
        }
        OutputFormat::CsvFile { csv_output } => write_csv_files(&aggregates, csv_output)?,
        OutputFormat::PdfFile { pdf_output } => {
            let charts = build_charts(&aggregates).context("rendering charts")?;
            let document = build_report_document(&aggregates.summary, charts);
            write_pdf(&document, pdf_output)
                .with_context(|| format!("writing {pdf_output:?}"))?;
        }
    }

    Ok(())
}

fn write_csv_files(aggregates: &SalesAggregates, csv_output: &Path) -> Result<()> {
    let stem = csv_output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    let ext = csv_output
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("csv");

    for (name, mut df) in aggregates.tables()? {
        let csv = write_csv_string(&mut df)?;
        let path = csv_output.with_file_name(format!("{stem}_{name}.{ext}"));
        std::fs::write(&path, &csv).with_context(|| format!("writing {path:?}"))?;
    }
    Ok(())
}

fn write_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .finish(df)
        .context("writing CSV")?;
    String::from_utf8(buf).context("CSV not valid UTF-8")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = config::load_config(&args.config)?;
    if let Some(input) = args.input {
        cfg.input = input;
    }
    run(&cfg)
}

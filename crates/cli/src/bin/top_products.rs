use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cl_core::config::{Engine, PipelineConfig};
use cl_core::sales::TopProduct;
use cl_datasets::Dataset;
use cl_runtime::{init_tracing, run, Report};

/// Top products by sales value within each product class.
#[derive(Debug, Parser)]
#[command(name = "top_products", version)]
struct Args {
    /// Directory holding transactions.json, products.json and product_classes.json, or `sample`.
    #[arg(long, default_value = "sample")]
    source: String,

    /// Write the report as JSON lines to this file instead of printing a table.
    #[arg(long)]
    target: Option<PathBuf>,

    /// JSON pipeline config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    workers: Option<usize>,

    /// `dataflow` or `batch`.
    #[arg(long)]
    engine: Option<Engine>,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                let cfg = PipelineConfig::from_json_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?;
                info!(path = %path.display(), "loaded configuration");
                cfg
            }
            None => PipelineConfig::default(),
        };
        if let Some(top_k) = self.top_k {
            cfg.top_k = top_k;
        }
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if let Some(engine) = self.engine {
            cfg.engine = engine;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn dataset(&self) -> Result<Dataset> {
        if self.source == "sample" {
            info!("no source directory given, using sample data");
            return Ok(cl_datasets::sample());
        }
        Dataset::load_dir(&self.source).with_context(|| format!("loading dataset from {}", self.source))
    }
}

fn write_json_lines(path: &Path, rows: &[TopProduct]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn print_table(rows: &[TopProduct]) {
    println!("{:<24} {:>4}  {:<32} {:>14}", "product_class_name", "rank", "product_name", "sales_value");
    for row in rows {
        println!(
            "{:<24} {:>4}  {:<32} {:>14}",
            row.product_class_name, row.rank, row.product_name, row.sales_value
        );
    }
}

/// Run statistics shown after the rows, or instead of them when a target file is written.
fn print_summary(report: &Report) {
    let m = &report.metrics;
    println!();
    println!(
        "transactions: {} loaded, {} valued, {} excluded | products aggregated: {} | rows: {} | {} ms",
        m.transactions_loaded,
        m.transactions_valued,
        m.transactions_excluded,
        m.aggregates,
        m.output_rows,
        report.elapsed.as_millis()
    );
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    info!(source = %args.source, "top_products starting");

    let cfg = args.pipeline_config()?;
    let dataset = args.dataset()?;
    let report = run(&dataset, &cfg)?;

    match &args.target {
        Some(path) => {
            write_json_lines(path, &report.rows)?;
            info!(path = %path.display(), rows = report.rows.len(), "report written");
        }
        None => print_table(&report.rows),
    }
    print_summary(&report);
    Ok(())
}

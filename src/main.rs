//! textbeam CLI
//!
//! Sanitize a text file or the rows of a PostgreSQL query and write the normalized
//! text followed by per-letter counts.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use textbeam::config::{Config, ConfigFile, Settings};
use textbeam::logging::{self, LogLevel};
use textbeam::CancelToken;

#[derive(Parser)]
#[command(name = "textbeam")]
#[command(about = "Normalize text and count its letters", long_about = None)]
struct Cli {
    /// Source kind: "file" or "db"
    #[arg(short, long)]
    source: Option<String>,

    /// Input file (file source)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// SQL query (db source)
    #[arg(short, long)]
    query: Option<String>,

    /// TOML config file; its values take precedence over flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bytes per file chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Task queue bound (default: twice the worker count)
    #[arg(long)]
    queue_depth: Option<usize>,

    /// Output strategy: "reread" or "reassemble"
    #[arg(long)]
    output: Option<String>,

    /// Do not echo the document to stdout
    #[arg(long)]
    quiet: bool,

    /// Save run metrics as JSON
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            source: self.source.clone(),
            input: self.input.clone(),
            target: self.target.clone(),
            query: self.query.clone(),
            chunk_size: self.chunk_size,
            workers: self.workers,
            queue_depth: self.queue_depth,
            output: self.output.clone(),
            echo: self.quiet.then_some(false),
            metrics: self.metrics.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = cli
        .config
        .as_ref()
        .map(ConfigFile::from_file)
        .transpose()
        .context("loading config file")?;
    let mut config = Config::resolve(file, cli.settings()).context("resolving configuration")?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    logging::init(&config.log);

    let pipeline = config
        .pipeline(CancelToken::new())
        .context("building pipeline")?;
    let report = pipeline.run().context("running pipeline")?;

    if let Some(path) = &config.metrics_path {
        report
            .metrics
            .save_to_file(path)
            .with_context(|| format!("saving metrics to {}", path.display()))?;
    }
    Ok(())
}

//! streamdex - replays change-stream batches into search indices.
//!
//! Usage:
//!   streamdex apply --events batch.json --config streamdex.toml
//!   streamdex mapping --describe orders.json --output lib/table_mapping.json
//!
//! `apply` reads a `{"Records": [...]}` batch and writes every change to each
//! configured backend. `mapping` builds the schema-mapping file from
//! `DescribeTable` output.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use streamdex_cli::{
    AppConfig, build_dispatcher, build_dry_run_dispatcher, mapping_from_files, read_batch,
    write_mapping,
};
use streamdex_dispatch::{BatchReport, Dispatcher};
use streamdex_types::{DEFAULT_MAPPING_PATH, SchemaMapping};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "streamdex")]
#[command(about = "Replay table change streams into Elasticsearch and OpenSearch")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a batch of change-stream records to the configured backends
    Apply(ApplyArgs),
    /// Generate the schema-mapping file from table descriptions
    Mapping(MappingArgs),
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Batch file in the `{"Records": [...]}` shape
    #[arg(short, long)]
    events: PathBuf,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema mapping file, overriding the config
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Plan and log every operation without contacting any backend
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct MappingArgs {
    /// `DescribeTable` output files
    #[arg(short, long, required = true, num_args = 1..)]
    describe: Vec<PathBuf>,

    /// Only keep tables bound to these stream ARNs
    #[arg(short, long)]
    source_arn: Vec<String>,

    /// Where to write the mapping
    #[arg(short, long, default_value = DEFAULT_MAPPING_PATH)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Apply(args) => apply(args).await,
        Command::Mapping(args) => mapping(args),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn apply(args: ApplyArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .with_env_fallback();
    if args.mapping.is_some() {
        config.mapping_path = args.mapping.clone();
    }

    let mapping = config.load_mapping()?;
    log_mapping(mapping.as_ref());

    let batch = read_batch(&args.events)?;
    info!("Read {} records from {}", batch.len(), args.events.display());

    let report = if args.dry_run {
        let (dispatcher, stores) = build_dry_run_dispatcher(&config, mapping);
        let report = dispatcher.dispatch_records(&batch.records).await;
        for store in &stores {
            for call in store.mutations().await {
                info!("[dry-run] {:?}", call);
            }
        }
        report
    } else {
        if config.backends.is_empty() {
            warn!("No backends configured; events will only be validated");
        }
        let dispatcher = build_dispatcher(&config, mapping)?;
        log_cluster_info(&dispatcher).await;
        dispatcher.dispatch_records(&batch.records).await
    };

    summarize(&report)
}

fn mapping(args: MappingArgs) -> Result<()> {
    let mapping = mapping_from_files(&args.describe, &args.source_arn)?;
    write_mapping(&mapping, &args.output)
}

fn log_mapping(mapping: Option<&SchemaMapping>) {
    match mapping {
        Some(m) => info!("Using schema mapping for {} tables", m.len()),
        None => info!("No schema mapping; using positional document ids"),
    }
}

async fn log_cluster_info(dispatcher: &Dispatcher) {
    for backend in dispatcher.backends() {
        match backend.cluster_info().await {
            Ok(cluster) => info!(
                "[{}] {} {} (cluster {})",
                backend.name(),
                cluster.distribution,
                cluster.version.as_deref().unwrap_or("unknown version"),
                cluster.cluster_name.as_deref().unwrap_or("unnamed"),
            ),
            Err(e) => warn!("[{}] cluster unreachable: {}", backend.name(), e),
        }
    }
}

fn summarize(report: &BatchReport) -> Result<()> {
    info!(
        "Processed {} events: {} acknowledged, {} failures",
        report.total,
        report.acknowledged,
        report.failures.len()
    );
    if !report.is_clean() {
        for failure in &report.failures {
            warn!(
                "event #{} ({}) on {}: {}",
                failure.position,
                failure.event_id.as_deref().unwrap_or("no id"),
                failure.backend.as_deref().unwrap_or("-"),
                failure.error
            );
        }
        bail!("{} of {} events failed", report.failed_positions().len(), report.total);
    }
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use hourtree_config::{ExportConfig, StorageBackend};
use hourtree_core::{Category, HourBucket, Record, Region};
use hourtree_storage::{MemoryRecordStore, OperatorSink};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// One-shot export runner: assemble and publish an hour-partitioned
/// export tree from a records file.
#[derive(Parser)]
#[command(name = "hourtree")]
#[command(version)]
#[command(about = "Assemble and publish an hour-partitioned export tree", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Records file, JSON lines: {"region": "DE", "bucket": 473700, "payload": "<hex>"}
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory (filesystem backend only)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    init_tracing(cli.log_level.as_deref());

    let mut config = if let Some(config_path) = &cli.config {
        ExportConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        ExportConfig::load().context("Failed to load configuration")?
    };
    apply_cli_overrides(&mut config, &cli)?;
    config.validate()?;

    let operator = build_operator(&config)?;
    let sink = OperatorSink::new(operator);

    let category = Category::new(config.export.category.clone());
    let store = MemoryRecordStore::new();
    if let Some(input) = &cli.input {
        let loaded = load_records(&store, input, &category)
            .with_context(|| format!("Failed to load records from {}", input.display()))?;
        info!(records = loaded, input = %input.display(), "records loaded");
    }

    let mut driver =
        hourtree_assembly::ExportDriver::new(&store, &sink, &config.export.namespace, category);
    if !config.export.regions.is_empty() {
        driver = driver.with_region_filter(
            config
                .export
                .regions
                .iter()
                .map(|region| Region::new(region.as_str()))
                .collect(),
        );
    }

    let summary = driver.run().await.context("Export run failed")?;
    info!(
        regions = summary.regions,
        leaves = summary.leaves,
        files = summary.files_written,
        "export published"
    );
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn apply_cli_overrides(config: &mut ExportConfig, cli: &Cli) -> Result<()> {
    // Override output directory (only valid for fs backend)
    if let Some(output) = &cli.output {
        if config.storage.backend != StorageBackend::Fs {
            anyhow::bail!(
                "--output flag only works with the filesystem backend, but backend is '{}'.\n\
                Either remove --output or set backend to 'fs' in the config file.",
                config.storage.backend
            );
        }
        let fs_config = config.storage.fs.get_or_insert_with(Default::default);
        fs_config.path = output.to_string_lossy().to_string();
    }
    Ok(())
}

fn build_operator(config: &ExportConfig) -> Result<opendal::Operator> {
    let operator = match config.storage.backend {
        StorageBackend::Fs => {
            let fs = config
                .storage
                .fs
                .as_ref()
                .context("fs config required for filesystem backend")?;
            info!("Using filesystem storage at: {}", fs.path);

            std::fs::create_dir_all(&fs.path)
                .with_context(|| format!("Failed to create output directory: {}", fs.path))?;
            let fs_builder = opendal::services::Fs::default().root(&fs.path);
            opendal::Operator::new(fs_builder)?.finish()
        }
        StorageBackend::S3 => {
            let s3 = config
                .storage
                .s3
                .as_ref()
                .context("s3 config required for S3 backend")?;
            info!(
                "Using S3 storage: bucket={}, region={}",
                s3.bucket, s3.region
            );

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region);
            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }
            opendal::Operator::new(s3_builder)?.finish()
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage (dry run)");
            opendal::Operator::new(opendal::services::Memory::default())?.finish()
        }
    };
    Ok(operator)
}

/// One line of the records input file.
#[derive(Debug, Deserialize)]
struct RecordLine {
    region: String,
    bucket: i64,
    /// Hex-encoded opaque payload bytes.
    payload: String,
}

fn load_records(store: &MemoryRecordStore, path: &Path, category: &Category) -> Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let mut count = 0;
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: RecordLine = serde_json::from_str(line)
            .with_context(|| format!("Invalid record on line {}", number + 1))?;
        let payload = hex::decode(&parsed.payload)
            .with_context(|| format!("Invalid payload hex on line {}", number + 1))?;
        store.save_records(
            vec![Record::new(Region::new(parsed.region), payload)],
            HourBucket::from_index(parsed.bucket),
            category,
        );
        count += 1;
    }
    Ok(count)
}

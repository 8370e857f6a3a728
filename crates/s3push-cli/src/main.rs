//! s3push - push local files and directories into an S3 bucket
//!
//! Usage: s3push [-n N] <source>... s3://bucket/prefix

mod s3_client;
mod upload;

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use s3push_core::utils::format_bytes;
use s3push_core::{
    Bounded, Credentials, Destination, Error, WorkerPool, DEFAULT_CONCURRENCY, DEFAULT_REGION,
    LIST_MAX_KEYS,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::s3_client::{create_client, S3Store};

#[derive(Parser, Debug)]
#[command(name = "s3push")]
#[command(version = s3push_core::VERSION)]
#[command(about = "Upload files and directories to an S3 bucket", long_about = None)]
struct Cli {
    /// Local files or directories followed by the destination (s3://bucket/prefix)
    #[arg(value_name = "PATH")]
    args: Vec<OsString>,

    /// Number of concurrent uploads
    #[arg(short = 'n', long = "concurrency", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Give up on a file after this many attempts (default: retry forever)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Base delay between attempts in milliseconds, doubled on each retry
    #[arg(long, default_value_t = 0)]
    retry_delay_ms: u64,

    /// Region of the bucket
    #[arg(long, env = "S3PUSH_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Custom endpoint for S3-compatible services
    #[arg(long, env = "S3PUSH_ENDPOINT")]
    endpoint: Option<String>,

    /// List the objects under the destination prefix after uploading
    #[arg(long)]
    list: bool,

    /// Show what would be uploaded without uploading
    #[arg(long)]
    dryrun: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "S3PUSH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Split positional arguments into sources and destination
    fn targets(&self) -> Option<(Vec<PathBuf>, &OsStr)> {
        let (destination, sources) = self.args.split_last()?;
        if sources.is_empty() {
            return None;
        }
        Some((sources.iter().map(PathBuf::from).collect(), destination.as_os_str()))
    }

    fn worker_pool(&self) -> WorkerPool {
        let pool = WorkerPool::new(self.concurrency);
        let delay = Duration::from_millis(self.retry_delay_ms);

        match self.max_attempts {
            Some(max) => pool.with_retry_policy(Bounded::new(max.max(1), delay)),
            None if !delay.is_zero() => pool.with_retry_policy(Bounded::new(u32::MAX, delay)),
            None => pool,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let Some((sources, target)) = cli.targets() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Sources may be any OS path, the destination must be valid UTF-8
    let target = target
        .to_str()
        .ok_or_else(|| Error::InvalidReference(target.to_string_lossy().into_owned()))?;
    let destination = Destination::parse(target)?;
    info!("Destination: {}", destination);

    if cli.dryrun {
        let summary = upload::dryrun(sources, &destination).await?;
        info!(
            "(dryrun) {} file(s), {}, {} skipped",
            summary.queued,
            format_bytes(summary.bytes),
            summary.skipped
        );
        return Ok(());
    }

    let credentials = Credentials::load().context("Reading config file")?;
    let client = create_client(&credentials, &cli.region, cli.endpoint.as_deref())?;
    let store = Arc::new(S3Store::new(client, destination.bucket.clone()));

    let pool = cli.worker_pool();
    info!("Starting {} upload worker(s)", pool.concurrency());

    let (summary, report) = upload::run(sources, &destination, pool, store.clone()).await?;

    info!(
        "Uploaded {} file(s), {} ({} retried attempt(s), {} skipped, {} abandoned)",
        report.uploaded,
        format_bytes(report.bytes),
        report.retries,
        summary.skipped,
        report.abandoned
    );

    if cli.list {
        upload::list(store.as_ref(), &destination, LIST_MAX_KEYS).await?;
    }

    Ok(())
}

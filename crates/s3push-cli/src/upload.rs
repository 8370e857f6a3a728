//! Upload run: wires the file walker to the worker pool

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use s3push_core::utils::clean_key;
use s3push_core::{walk, Destination, ObjectStore, PoolReport, WalkSummary, WorkerPool};

/// Walk `sources` and upload everything found under `destination`.
///
/// The walker runs on a blocking thread and feeds a queue sized to the pool,
/// so traversal never gets further ahead than one task per worker.
pub async fn run(
    sources: Vec<PathBuf>,
    destination: &Destination,
    pool: WorkerPool,
    store: Arc<dyn ObjectStore>,
) -> Result<(WalkSummary, PoolReport)> {
    let (tx, rx) = async_channel::bounded(pool.concurrency());

    let walk_destination = destination.clone();
    let walker = tokio::task::spawn_blocking(move || walk(&sources, &walk_destination, &tx));

    let report = pool.run(rx, store).await;
    let summary = walker.await.context("File walker failed")?;

    Ok((summary, report))
}

/// Print what would be uploaded without contacting the storage service
pub async fn dryrun(sources: Vec<PathBuf>, destination: &Destination) -> Result<WalkSummary> {
    let (tx, rx) = async_channel::bounded(1);

    let walk_destination = destination.clone();
    let walker = tokio::task::spawn_blocking(move || walk(&sources, &walk_destination, &tx));

    while let Ok(task) = rx.recv().await {
        println!(
            "(dryrun) upload: {} -> {}",
            task.local_path().display(),
            destination.object_uri(task.remote_key())
        );
    }

    walker.await.context("File walker failed")
}

/// Print `key<TAB>size` for the objects under the destination prefix.
///
/// The prefix is normalized the same way upload keys are.
pub async fn list(store: &dyn ObjectStore, destination: &Destination, max_keys: i32) -> Result<usize> {
    let prefix = clean_key(&destination.key_prefix);
    let entries = store
        .list(&prefix, None, None, max_keys)
        .await
        .with_context(|| format!("Listing {} failed", destination))?;

    for entry in &entries {
        println!("{}\t{}", entry.key, entry.size);
    }

    Ok(entries.len())
}

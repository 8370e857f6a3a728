//! Upload worker pool
//!
//! A fixed number of workers drain a shared bounded queue. Each worker
//! uploads one task at a time and keeps retrying it until it succeeds (or the
//! retry policy gives up), so at most `concurrency` uploads are ever in
//! flight.

use std::sync::Arc;

use async_channel::Receiver;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;
use tracing::{debug, error, info, warn};

use crate::retry::{RetryPolicy, Unbounded};
use crate::store::{Acl, ObjectStore};
use crate::utils::guess_content_type;
use crate::{Result, UploadTask};

/// Counters reported once every worker has exited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Tasks uploaded successfully
    pub uploaded: usize,
    /// Bytes uploaded successfully
    pub bytes: u64,
    /// Failed attempts that were retried
    pub retries: u64,
    /// Tasks dropped because the retry policy gave up
    pub abandoned: usize,
}

impl PoolReport {
    fn merge(&mut self, other: PoolReport) {
        self.uploaded += other.uploaded;
        self.bytes += other.bytes;
        self.retries += other.retries;
        self.abandoned += other.abandoned;
    }
}

/// Fixed-size pool of upload workers
pub struct WorkerPool {
    concurrency: usize,
    retry_policy: Arc<dyn RetryPolicy>,
    acl: Acl,
}

impl WorkerPool {
    /// Create a pool that retries failed uploads forever.
    /// A concurrency of zero is raised to one.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            retry_policy: Arc::new(Unbounded),
            acl: Acl::PublicRead,
        }
    }

    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Arc::new(policy);
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = acl;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run the workers until `queue` is closed and drained.
    pub async fn run(self, queue: Receiver<UploadTask>, store: Arc<dyn ObjectStore>) -> PoolReport {
        let mut handles = Vec::with_capacity(self.concurrency);

        for id in 0..self.concurrency {
            let worker = Worker {
                id,
                queue: queue.clone(),
                store: Arc::clone(&store),
                retry_policy: Arc::clone(&self.retry_policy),
                acl: self.acl,
            };
            handles.push(tokio::spawn(worker.run()));
        }
        drop(queue);

        let mut report = PoolReport::default();
        for handle in handles {
            match handle.await {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => error!("Upload worker panicked: {}", e),
            }
        }

        report
    }
}

enum Outcome {
    Uploaded { retries: u64 },
    Abandoned { retries: u64 },
}

struct Worker {
    id: usize,
    queue: Receiver<UploadTask>,
    store: Arc<dyn ObjectStore>,
    retry_policy: Arc<dyn RetryPolicy>,
    acl: Acl,
}

impl Worker {
    async fn run(self) -> PoolReport {
        debug!("Upload worker {} started", self.id);
        let mut report = PoolReport::default();

        while let Ok(task) = self.queue.recv().await {
            match self.process(&task).await {
                Outcome::Uploaded { retries } => {
                    report.uploaded += 1;
                    report.bytes += task.size();
                    report.retries += retries;
                }
                Outcome::Abandoned { retries } => {
                    report.abandoned += 1;
                    report.retries += retries;
                }
            }
        }

        debug!("Upload worker {} stopped", self.id);
        report
    }

    /// Upload one task, retrying as the policy allows
    async fn process(&self, task: &UploadTask) -> Outcome {
        let content_type = guess_content_type(task.local_path());
        info!(
            "upload: {} -> {} ({}, {} bytes)",
            task.local_path().display(),
            task.remote_key(),
            content_type,
            task.size()
        );

        // Opened on the first attempt and reused by retries
        let mut file: Option<File> = None;
        let mut failed: u32 = 0;

        loop {
            let result = match file.as_mut() {
                Some(f) => self.put_from_start(task, f, &content_type).await,
                None => match File::open(task.local_path()).await {
                    Ok(f) => {
                        self.put_from_start(task, file.insert(f), &content_type)
                            .await
                    }
                    Err(e) => Err(e.into()),
                },
            };

            let err = match result {
                Ok(()) => {
                    debug!("Uploaded {} after {} attempt(s)", task.remote_key(), failed + 1);
                    return Outcome::Uploaded {
                        retries: u64::from(failed),
                    };
                }
                Err(e) => e,
            };

            failed = failed.saturating_add(1);
            warn!(
                "Upload of {} failed (attempt {}): {}",
                task.remote_key(),
                failed,
                err
            );

            match self.retry_policy.next_delay(failed) {
                Some(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                None => {
                    error!(
                        "Giving up on {} after {} attempts",
                        task.remote_key(),
                        failed
                    );
                    return Outcome::Abandoned {
                        retries: u64::from(failed - 1),
                    };
                }
            }
        }
    }

    async fn put_from_start(&self, task: &UploadTask, file: &mut File, content_type: &str) -> Result<()> {
        file.rewind().await?;
        self.store
            .put(task.remote_key(), file, task.size(), content_type, self.acl)
            .await
    }
}

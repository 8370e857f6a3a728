//! s3push Core Library
//!
//! Upload pipeline for pushing local files and directories into an
//! object-storage bucket: destination parsing, file walking, the bounded
//! worker pool and its retry policy.

pub mod config;
pub mod error;
pub mod pool;
pub mod retry;
pub mod store;
pub mod target;
pub mod task;
pub mod utils;
pub mod walker;

pub use config::Credentials;
pub use error::{Error, Result};
pub use pool::{PoolReport, WorkerPool};
pub use retry::{Bounded, RetryPolicy, Unbounded};
pub use store::{Acl, ObjectEntry, ObjectStore};
pub use target::Destination;
pub use task::UploadTask;
pub use walker::{walk, WalkSummary};

/// s3push version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of concurrent upload workers
pub const DEFAULT_CONCURRENCY: usize = 3;

/// URI scheme accepted for destination references
pub const SCHEME: &str = "s3://";

/// Default region, used when none is configured
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Maximum number of keys returned by the post-upload listing
pub const LIST_MAX_KEYS: i32 = 100;

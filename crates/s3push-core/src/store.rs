//! Object storage client boundary

use std::fmt;

use async_trait::async_trait;
use tokio::fs::File;

use crate::Result;

/// Canned access policy applied to uploaded objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acl {
    Private,
    #[default]
    PublicRead,
}

impl Acl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Private => "private",
            Acl::PublicRead => "public-read",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object returned by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: i64,
}

/// Storage client used by the worker pool.
///
/// Implementations are bound to a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `size` bytes of `body`, starting at its current position.
    ///
    /// The file is streamed; implementations must not buffer it whole.
    async fn put(
        &self,
        key: &str,
        body: &mut File,
        size: u64,
        content_type: &str,
        acl: Acl,
    ) -> Result<()>;

    /// List objects under `prefix`, starting after `marker`
    async fn list(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectEntry>>;
}

//! Upload task model

use std::path::{Path, PathBuf};

use crate::utils::join_key;

/// One local file and the key it is uploaded to.
///
/// Tasks are built by the walker and never change after they are queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    local_path: PathBuf,
    size: u64,
    remote_key: String,
}

impl UploadTask {
    /// Build a task whose key is `relative` placed under `key_prefix`
    pub fn new(local_path: impl Into<PathBuf>, size: u64, key_prefix: &str, relative: &str) -> Self {
        Self {
            local_path: local_path.into(),
            size,
            remote_key: join_key(key_prefix, relative),
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn remote_key(&self) -> &str {
        &self.remote_key
    }
}

//! Error types for s3push

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Credentials file missing, unreadable or incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// Destination reference is not of the form s3://bucket[/prefix]
    #[error("Invalid target reference: {0}")]
    InvalidReference(String),

    /// A local path could not be stat'ed or walked
    #[error("Cannot read {}: {message}", path.display())]
    Traversal { path: PathBuf, message: String },

    /// The storage backend rejected or failed a request
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn traversal(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Traversal {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error aborts the run before any upload happens
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidReference(_))
    }
}

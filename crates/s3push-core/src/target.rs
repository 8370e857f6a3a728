//! Destination references
//!
//! Format: s3://bucket/prefix or s3://bucket

use std::fmt;

use crate::{Error, Result, SCHEME};

/// Where uploads land: a bucket and a key prefix inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub bucket: String,
    pub key_prefix: String,
}

impl Destination {
    /// Parse a destination reference.
    ///
    /// The remainder after the scheme is split on the first `/`. The prefix is
    /// returned as written; remote keys are normalized when tasks are built.
    pub fn parse(reference: &str) -> Result<Self> {
        if reference.len() <= SCHEME.len() {
            return Err(Error::InvalidReference(reference.to_string()));
        }

        let rest = reference
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidReference(reference.to_string()))?;

        let (bucket, key_prefix) = rest.split_once('/').unwrap_or((rest, ""));

        if bucket.is_empty() {
            return Err(Error::InvalidReference(reference.to_string()));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key_prefix: key_prefix.to_string(),
        })
    }

    /// Reference for a key inside this destination's bucket
    pub fn object_uri(&self, key: &str) -> String {
        format!("{}{}/{}", SCHEME, self.bucket, key)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", SCHEME, self.bucket, self.key_prefix)
    }
}

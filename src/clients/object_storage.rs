//! # Object Storage
//!
//! Photo retrieval for print bundles. Photo locations are stored either as
//! `s3://bucket/key` URLs or as `arn:aws:s3:::bucket/key` ARNs.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::{PrintFulfillmentError, Result};

const S3_URL_PREFIX: &str = "s3://";
const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Bucket and key of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Lowercased extension of the key, `None` when the key has none
    pub fn extension(&self) -> Option<String> {
        let file_name = self.key.rsplit('/').next()?;
        let (stem, extension) = file_name.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{S3_URL_PREFIX}{}/{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectLocation {
    type Err = PrintFulfillmentError;

    fn from_str(location: &str) -> Result<Self> {
        let path = location
            .strip_prefix(S3_URL_PREFIX)
            .or_else(|| location.strip_prefix(S3_ARN_PREFIX))
            .ok_or_else(|| PrintFulfillmentError::InvalidPhotoLocation(location.to_string()))?;

        match path.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(bucket, key))
            }
            _ => Err(PrintFulfillmentError::InvalidPhotoLocation(
                location.to_string(),
            )),
        }
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

/// Objects stored on the local filesystem as `{root}/{bucket}/{key}`
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self
            .object_path(bucket, key)
            .ok_or_else(|| PrintFulfillmentError::ObjectStorage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "key escapes the storage root".to_string(),
            })?;

        debug!(path = %path.display(), "Reading object");
        tokio::fs::read(&path)
            .await
            .map_err(|e| PrintFulfillmentError::ObjectStorage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: DashMap<ObjectLocation, Vec<u8>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        self.objects
            .insert(ObjectLocation::new(bucket, key), bytes.into());
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(&ObjectLocation::new(bucket, key))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PrintFulfillmentError::ObjectStorage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "NoSuchKey".to_string(),
            })
    }
}

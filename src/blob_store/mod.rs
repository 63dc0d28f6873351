mod local;

pub use local::LocalStore;

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Blob exceeds maximum size of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),
}

/// Readable handle to a stored blob.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// A blob found by [`BlobStore::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedBlob {
    /// `/`-separated path relative to the store root
    pub key: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Abstraction over raw content storage.
/// Keys are relative paths -- the store knows nothing about names, tokens or sharing.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream `source` into a new blob at `key`, returning the number of bytes written.
    ///
    /// Fails with [`BlobStoreError::TooLarge`] once more than `limit` bytes arrive.
    /// Any failure removes the partially written blob.
    async fn write(
        &self,
        key: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        limit: u64,
    ) -> Result<u64, BlobStoreError>;
    async fn open(&self, key: &str) -> Result<BlobReader, BlobStoreError>;
    async fn remove(&self, key: &str) -> Result<(), BlobStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError>;
    async fn scan(&self) -> Result<Vec<ScannedBlob>, BlobStoreError>;
}

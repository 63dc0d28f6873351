use std::collections::{BTreeMap, HashMap, HashSet};
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::RwLock;

use super::models::FileRecord;
use super::token::{RandomTokens, TokenError, TokenSource};
use crate::blob_store::{BlobStore, BlobStoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid file name: {0}")]
    InvalidName(String),
    #[error("File exceeds maximum upload size of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Storage error: {0}")]
    Storage(BlobStoreError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl From<BlobStoreError> for RegistryError {
    fn from(e: BlobStoreError) -> Self {
        match e {
            BlobStoreError::TooLarge { limit } => RegistryError::TooLarge { limit },
            other => RegistryError::Storage(other),
        }
    }
}

/// Everything guarded by the registry lock.
#[derive(Default)]
pub(super) struct Index {
    /// name -> record, ordered so listings come out sorted by name
    pub(super) files: BTreeMap<String, FileRecord>,
    /// public token -> name
    pub(super) tokens: HashMap<String, String>,
    /// every token handed out by this process, live or revoked
    pub(super) issued: HashSet<String>,
}

impl Index {
    /// The shared record behind `token`, if any.
    pub(super) fn by_token(&self, token: &str) -> Option<&FileRecord> {
        self.tokens
            .get(token)
            .and_then(|name| self.files.get(name))
            .filter(|file| file.public_token.as_deref() == Some(token))
    }
}

/// In-memory index of stored files.
///
/// Reads (`list`, `lookup`, `lookup_by_token`, `open`) share the lock; every
/// mutation holds it exclusively. Names reserved by uploads still streaming to
/// the blob store live in `pending`, which is only ever locked while the index
/// lock is held or when a reservation is released.
pub struct Registry {
    pub(super) index: RwLock<Index>,
    pending: Arc<Mutex<HashSet<String>>>,
    pub(super) store: Arc<dyn BlobStore>,
    pub(super) tokens: Box<dyn TokenSource>,
    pub(super) max_upload_size: u64,
}

impl Registry {
    /// Create an empty registry over `store`.
    pub fn new(store: Arc<dyn BlobStore>, max_upload_size: u64) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            pending: Arc::new(Mutex::new(HashSet::new())),
            store,
            tokens: Box::new(RandomTokens::new()),
            max_upload_size,
        }
    }

    /// Rebuild the registry from whatever the blob store already holds.
    pub async fn load(
        store: Arc<dyn BlobStore>,
        max_upload_size: u64,
    ) -> Result<Self, RegistryError> {
        let blobs = store.scan().await?;
        let registry = Self::new(store, max_upload_size);
        {
            let mut index = registry.index.write().await;
            for blob in blobs {
                let record = FileRecord {
                    name: blob.key.clone(),
                    size: blob.size,
                    storage_key: blob.key,
                    public_token: None,
                    created_at: blob.modified,
                };
                index.files.insert(record.name.clone(), record);
            }
            tracing::info!(files = index.files.len(), "Registry loaded from blob store");
        }
        Ok(registry)
    }

    /// Replace the token source (the default draws from the system CSPRNG).
    pub fn with_token_source(mut self, tokens: Box<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Whether `name` is indexed, reserved, or already present in the blob store.
    pub(super) async fn is_taken(&self, index: &Index, name: &str) -> Result<bool, RegistryError> {
        let claimed = index.files.contains_key(name) || lock(&self.pending).contains(name);
        if claimed {
            return Ok(true);
        }
        Ok(self.store.exists(name).await?)
    }
}

fn lock(pending: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Reserved,
    Written,
    Committed,
}

/// A resolved name held for an in-flight upload.
///
/// Dropping it releases the name. If the content was written but the record
/// never committed, the blob is removed first and the name is released after.
pub(super) struct Reservation {
    pending: Arc<Mutex<HashSet<String>>>,
    store: Arc<dyn BlobStore>,
    pub(super) name: String,
    stage: Stage,
}

impl Reservation {
    /// Claim `name`; the caller must hold the index write lock and have checked availability.
    pub(super) fn claim(registry: &Registry, name: String) -> Self {
        lock(&registry.pending).insert(name.clone());
        Self {
            pending: Arc::clone(&registry.pending),
            store: Arc::clone(&registry.store),
            name,
            stage: Stage::Reserved,
        }
    }

    pub(super) fn written(&mut self) {
        self.stage = Stage::Written;
    }

    /// The record is indexed; call with the index write lock held.
    pub(super) fn commit(mut self) {
        self.stage = Stage::Committed;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.stage != Stage::Written {
            lock(&self.pending).remove(&self.name);
            return;
        }

        let name = mem::take(&mut self.name);
        let pending = Arc::clone(&self.pending);
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match store.remove(&name).await {
                        Ok(()) => tracing::debug!(name = %name, "Removed uncommitted blob"),
                        Err(e) => {
                            tracing::warn!(name = %name, error = %e, "Failed to remove uncommitted blob")
                        }
                    }
                    lock(&pending).remove(&name);
                });
            }
            Err(_) => {
                tracing::warn!(name = %name, "Uncommitted blob left in store, no runtime to remove it");
                lock(&pending).remove(&name);
            }
        }
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use super::{BlobReader, BlobStore, BlobStoreError, ScannedBlob};

/// Filesystem blob store rooted at a single directory.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let mut path = self.base_path.clone();
        for segment in key.split('/') {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) => path.push(part),
                _ => return Err(BlobStoreError::InvalidKey(key.to_string())),
            }
        }
        Ok(path)
    }
}

/// Removes a blob that was never completed, unless [`PartialBlob::keep`] is called.
struct PartialBlob {
    path: PathBuf,
    keep: bool,
}

impl PartialBlob {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for PartialBlob {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial blob");
            }
        }
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn write(
        &self,
        key: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        limit: u64,
    ) -> Result<u64, BlobStoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        let partial = PartialBlob::new(path);

        // One byte past the limit is enough to know the source is too large.
        let mut limited = source.take(limit.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file).await?;
        if written > limit {
            drop(file);
            return Err(BlobStoreError::TooLarge { limit });
        }

        file.flush().await?;
        file.sync_all().await?;
        partial.keep();
        Ok(written)
    }

    async fn open(&self, key: &str) -> Result<BlobReader, BlobStoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), BlobStoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn scan(&self) -> Result<Vec<ScannedBlob>, BlobStoreError> {
        let mut blobs = Vec::new();
        let mut pending = vec![(self.base_path.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let Ok(file_name) = entry.file_name().into_string() else {
                    tracing::warn!(path = %entry.path().display(), "Skipping blob with non-UTF-8 name");
                    continue;
                };
                let key = if prefix.is_empty() {
                    file_name
                } else {
                    format!("{prefix}/{file_name}")
                };

                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push((entry.path(), key));
                } else if metadata.is_file() {
                    let modified = metadata
                        .modified()
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now());
                    blobs.push(ScannedBlob {
                        key,
                        size: metadata.len(),
                        modified,
                    });
                }
            }
        }

        Ok(blobs)
    }
}

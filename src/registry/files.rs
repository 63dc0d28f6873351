use chrono::Utc;
use tokio::io::AsyncRead;

use super::index::{Registry, RegistryError, Reservation};
use super::models::FileRecord;
use super::naming;
use super::token::TokenError;
use crate::blob_store::BlobReader;

/// Fresh tokens drawn before giving up on a source that only repeats itself.
const MAX_MINT_ATTEMPTS: usize = 16;

impl Registry {
    // ========================================================================
    // Uploads
    // ========================================================================

    /// Store `source` under `desired_name`, or under a disambiguated name if it is taken.
    ///
    /// The resolved name is reserved before any bytes are written, so concurrent
    /// uploads of the same name never land on the same record. Writes of
    /// different files proceed in parallel.
    pub async fn register(
        &self,
        desired_name: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRecord, RegistryError> {
        naming::validate(desired_name).map_err(RegistryError::InvalidName)?;

        let mut reservation = self.reserve(desired_name).await?;
        let size = self
            .store
            .write(&reservation.name, source, self.max_upload_size)
            .await?;
        // From here on, dropping the reservation also removes the blob.
        reservation.written();

        let record = FileRecord {
            name: reservation.name.clone(),
            size,
            storage_key: reservation.name.clone(),
            public_token: None,
            created_at: Utc::now(),
        };

        let mut index = self.index.write().await;
        index.files.insert(record.name.clone(), record.clone());
        reservation.commit();

        tracing::debug!(name = %record.name, size, "Registered file");
        Ok(record)
    }

    async fn reserve(&self, desired_name: &str) -> Result<Reservation, RegistryError> {
        let index = self.index.write().await;
        if !self.is_taken(&index, desired_name).await? {
            return Ok(Reservation::claim(self, desired_name.to_string()));
        }

        let now = Utc::now();
        let mut attempt = 0;
        loop {
            let candidate = naming::disambiguate(desired_name, now, attempt);
            if !self.is_taken(&index, &candidate).await? {
                tracing::debug!(desired = %desired_name, resolved = %candidate, "Resolved name collision");
                return Ok(Reservation::claim(self, candidate));
            }
            attempt += 1;
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Snapshot of every record, sorted by name.
    pub async fn list(&self) -> Vec<FileRecord> {
        self.index.read().await.files.values().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.index.read().await.files.len()
    }

    pub async fn lookup(&self, name: &str) -> Result<FileRecord, RegistryError> {
        self.index
            .read()
            .await
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Resolve a public token. Only records that are currently shared match.
    pub async fn lookup_by_token(&self, token: &str) -> Result<FileRecord, RegistryError> {
        self.index
            .read()
            .await
            .by_token(token)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(token.to_string()))
    }

    /// Look up a file by name and open its content.
    pub async fn open(&self, name: &str) -> Result<(FileRecord, BlobReader), RegistryError> {
        let index = self.index.read().await;
        let file = index
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let reader = self.store.open(&file.storage_key).await?;
        Ok((file, reader))
    }

    /// Look up a shared file by token and open its content.
    pub async fn open_public(
        &self,
        token: &str,
    ) -> Result<(FileRecord, BlobReader), RegistryError> {
        let index = self.index.read().await;
        let file = index
            .by_token(token)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(token.to_string()))?;
        let reader = self.store.open(&file.storage_key).await?;
        Ok((file, reader))
    }

    // ========================================================================
    // Sharing
    // ========================================================================

    /// Make a file public, returning its token. Sharing a shared file returns the same token.
    pub async fn share(&self, name: &str) -> Result<String, RegistryError> {
        let mut guard = self.index.write().await;
        let index = &mut *guard;
        let file = index
            .files
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if let Some(token) = &file.public_token {
            return Ok(token.clone());
        }

        let mut minted = None;
        for _ in 0..MAX_MINT_ATTEMPTS {
            let candidate = self.tokens.mint()?;
            if !index.issued.contains(&candidate) {
                minted = Some(candidate);
                break;
            }
        }
        let Some(token) = minted else {
            tracing::warn!(name = %name, "Token source kept repeating issued tokens");
            return Err(TokenError.into());
        };

        index.issued.insert(token.clone());
        index.tokens.insert(token.clone(), name.to_string());
        file.public_token = Some(token.clone());

        tracing::debug!(name = %name, "Shared file");
        Ok(token)
    }

    /// Revoke a file's public token. Unsharing a private file is a no-op.
    pub async fn unshare(&self, name: &str) -> Result<(), RegistryError> {
        let mut guard = self.index.write().await;
        let index = &mut *guard;
        let file = index
            .files
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if let Some(token) = file.public_token.take() {
            index.tokens.remove(&token);
            tracing::debug!(name = %name, "Unshared file");
        }
        Ok(())
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Remove a file's content and then its record.
    ///
    /// The lock is held across the blob removal; if removal fails the record
    /// stays, so the index and the store never disagree.
    pub async fn delete(&self, name: &str) -> Result<(), RegistryError> {
        let mut index = self.index.write().await;
        let storage_key = index
            .files
            .get(name)
            .map(|file| file.storage_key.clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        self.store.remove(&storage_key).await?;

        if let Some(file) = index.files.remove(name) {
            if let Some(token) = file.public_token {
                index.tokens.remove(&token);
            }
        }

        tracing::debug!(name = %name, "Deleted file");
        Ok(())
    }
}

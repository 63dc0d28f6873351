use chrono::{DateTime, Utc};

/// Metadata for one stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Unique logical name, the registry key
    pub name: String,
    pub size: u64,
    /// Blob store key holding the content; never shared between records
    pub storage_key: String,
    /// Present only while the file is shared
    pub public_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_public(&self) -> bool {
        self.public_token.is_some()
    }
}

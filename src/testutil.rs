//! Shared test helpers for in-crate tests.

use std::sync::Arc;

use crate::blob_store::LocalStore;
use crate::config::{Config, ServerConfig, StorageConfig};
use crate::registry::Registry;
use crate::AppState;

pub const TEST_OPERATOR_TOKEN: &str = "test-operator-token";

/// Create a test AppState with an empty registry over a temporary local store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        storage: StorageConfig {
            root: files_dir.to_string_lossy().to_string(),
        },
        max_upload_size: 1024, // 1KB for tests
        operator_token: Some(TEST_OPERATOR_TOKEN.to_string()),
    };

    let store = LocalStore::new(&files_dir).expect("Failed to create test blob store");
    let registry = Registry::new(Arc::new(store), config.max_upload_size);

    Arc::new(AppState { config, registry })
}

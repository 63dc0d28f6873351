//! file-drop - upload, list, download and delete files, and share them through revocable public links
//!
//! This crate provides:
//! - A concurrency-safe in-memory registry of stored files, rebuilt from disk on startup
//! - Collision-free naming for uploads, even when the same name arrives concurrently
//! - Unguessable public tokens that can be minted and revoked per file
//! - A swappable blob store abstraction with a local filesystem backend
//! - REST API with streaming multipart upload and download

pub mod api;
pub mod blob_store;
pub mod config;
pub mod registry;
#[cfg(test)]
pub mod testutil;

use config::Config;
use registry::Registry;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub registry: Registry,
}

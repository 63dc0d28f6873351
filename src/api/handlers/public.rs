use axum::extract::{Path, State};
use axum::response::Response;
use std::sync::Arc;

use super::{content_response, registry_error};
use crate::api::response::ApiError;
use crate::registry::RegistryError;
use crate::AppState;

/// Serve a shared file's content by its public token. No authentication.
/// Route: GET /public/:token
pub async fn serve_public(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let (file, reader) = state
        .registry
        .open_public(&token)
        .await
        .map_err(|e| match e {
            RegistryError::NotFound(_) => ApiError::not_found("File not found or not public"),
            other => registry_error(other),
        })?;

    tracing::debug!(name = %file.name, "Serving public file");

    // Revocation must take effect immediately, so nothing may cache the content.
    Ok(content_response(&file, reader, "no-store"))
}

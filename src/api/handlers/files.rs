use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::Json;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::StreamReader;

use super::{content_response, registry_error};
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::registry::FileRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub created_at: String,
    pub is_public: bool,
    pub name: String,
    pub public_token: Option<String>,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub name: String,
    pub token: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    /// Page size; the full listing is returned when absent
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Fail(e.status(), format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("file field must carry a filename"))?;

        let body = StreamReader::new(field.map_err(std::io::Error::other));
        tokio::pin!(body);

        let file = state
            .registry
            .register(&file_name, &mut body)
            .await
            .map_err(registry_error)?;

        tracing::info!(name = %file.name, size = file.size, "Uploaded file");
        return Ok(JSend::success(file_to_response(&file)));
    }

    Err(ApiError::bad_request("file field is required"))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileResponse>>, ApiError> {
    if params.limit == Some(0) {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let files = state.registry.list().await;
    let total = files.len() as u64;
    let items: Vec<FileResponse> = files
        .iter()
        .skip(params.offset as usize)
        .take(params.limit.map_or(usize::MAX, |limit| limit as usize))
        .map(file_to_response)
        .collect();

    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    ))
}

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let (file, reader) = state.registry.open(&name).await.map_err(registry_error)?;
    Ok(content_response(&file, reader, "private, no-cache"))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .registry
        .delete(&name)
        .await
        .map_err(registry_error)?;

    tracing::info!(name = %name, "Deleted file");
    Ok(JSend::success(()))
}

pub async fn share_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<JSend<ShareResponse>>, ApiError> {
    let token = state.registry.share(&name).await.map_err(registry_error)?;

    Ok(JSend::success(ShareResponse {
        url: format!("/public/{token}"),
        name,
        token,
    }))
}

pub async fn unshare_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .registry
        .unshare(&name)
        .await
        .map_err(registry_error)?;

    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        created_at: file.created_at.to_rfc3339(),
        is_public: file.is_public(),
        name: file.name.clone(),
        public_token: file.public_token.clone(),
        size: file.size,
    }
}

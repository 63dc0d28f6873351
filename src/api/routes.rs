use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::auth::require_operator;
use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = (state.config.max_upload_size as usize).saturating_add(MULTIPART_OVERHEAD);

    let operator = Router::new()
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/:name", get(handlers::download_file))
        .route("/files/:name", delete(handlers::delete_file))
        .route("/files/:name/share", post(handlers::share_file))
        .route("/files/:name/share", delete(handlers::unshare_file))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_operator,
        ));

    Router::new()
        .merge(operator)
        // Public content (token download)
        .route("/public/:token", get(handlers::serve_public))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

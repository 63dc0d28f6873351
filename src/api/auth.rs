use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use ring::digest::{digest, SHA256};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::AppState;

/// Require `Authorization: Bearer <OPERATOR_TOKEN>` on operator routes.
/// Passes everything through when no operator token is configured.
pub async fn require_operator(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.operator_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    match presented {
        Some(token) if secrets_match(&token, expected) => Ok(next.run(req).await),
        Some(_) => {
            tracing::debug!(path = %req.uri().path(), "Rejected operator request with wrong token");
            Err(ApiError::unauthorized("Invalid operator token"))
        }
        None => Err(ApiError::unauthorized("Missing bearer token")),
    }
}

/// Compare digests so the comparison time does not depend on the secret's contents.
fn secrets_match(presented: &str, expected: &str) -> bool {
    digest(&SHA256, presented.as_bytes()).as_ref() == digest(&SHA256, expected.as_bytes()).as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3cre"));
        assert!(!secrets_match("", "s3cret"));
    }
}

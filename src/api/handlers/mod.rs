mod files;
mod health;
mod public;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tokio_util::io::ReaderStream;

use crate::api::response::ApiError;
use crate::blob_store::{BlobReader, BlobStoreError};
use crate::registry::{FileRecord, RegistryError};

pub use files::{delete_file, download_file, list_files, share_file, unshare_file, upload_file};
pub use health::health;
pub use public::serve_public;

/// Map a RegistryError to an ApiError
fn registry_error(e: RegistryError) -> ApiError {
    match e {
        RegistryError::NotFound(_) => ApiError::not_found("File not found"),
        RegistryError::InvalidName(reason) => {
            ApiError::bad_request(format!("Invalid file name: {reason}"))
        }
        RegistryError::TooLarge { limit } => ApiError::payload_too_large(format!(
            "File exceeds maximum upload size of {limit} bytes"
        )),
        RegistryError::Storage(BlobStoreError::NotFound(_)) => {
            ApiError::not_found("File content not found")
        }
        e @ (RegistryError::Storage(_) | RegistryError::Token(_)) => {
            tracing::error!(error = %e, "Registry operation failed");
            ApiError::internal(e.to_string())
        }
    }
}

/// Stream a file's content as an attachment download.
fn content_response(file: &FileRecord, reader: BlobReader, cache_control: &'static str) -> Response {
    let body = Body::from_stream(ReaderStream::new(reader));
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();

    let mime_type = mime_guess::from_path(&file.name).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime_type.as_ref())
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size));

    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file.name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    response
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 filename.
fn content_disposition(name: &str) -> String {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(file_name, NON_ALPHANUMERIC);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report%2Epdf"
        );
    }

    #[test]
    fn test_content_disposition_uses_last_segment() {
        assert!(content_disposition("scans/2024/receipt.png").starts_with(
            "attachment; filename=\"receipt.png\""
        ));
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("résumé \"final\".txt");
        assert!(value.starts_with("attachment; filename=\"r_sum_ _final_.txt\""));
        assert!(value.contains("filename*=UTF-8''r%C3%A9sum%C3%A9%20%22final%22%2Etxt"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}

//! Upload Routes
//!
//! Endpoint:
//! - POST /mic - multipart form, field `file` stored under its sanitized name

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::state::AppState;
use crate::upload::{sanitize_filename, ErrorResponse, UploadError, UploadResponse, FILE_FIELD};

// ============================================================================
// Error Response
// ============================================================================

impl IntoResponse for UploadError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Upload failed");
        } else {
            tracing::warn!(error = %self, "Upload rejected");
        }

        let body = Json(ErrorResponse {
            error: self.public_message().to_string(),
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the upload router
pub fn router(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/mic", post(receive_upload))
        .layer(DefaultBodyLimit::max(max_upload_size))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /mic
///
/// Stores the first file part named `file`. Parts with other names, and a
/// `file` part without a filename (a plain form value), are skipped. A request
/// that is not multipart at all has no file field.
async fn receive_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Request is not a multipart form");
        UploadError::MissingField
    })?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(raw_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        if raw_name.is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        let file_name = sanitize_filename(&raw_name);
        tracing::debug!(raw_name = %raw_name, file_name = %file_name, "Receiving upload");

        // Dropping `pending` on any early return removes the temporary file
        let mut pending = state.store().begin(&file_name).await?;
        while let Some(chunk) = field.chunk().await? {
            pending.write(&chunk).await?;
        }
        let bytes = pending.written();
        let path = pending.commit().await?;

        tracing::info!(
            file_name = %file_name,
            bytes = bytes,
            path = %path.display(),
            "File uploaded"
        );

        return Ok(Json(UploadResponse::stored(&file_name)));
    }

    Err(UploadError::MissingField)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "mic-receiver-test-boundary";

    /// One part of a hand-built multipart body
    struct Part<'a> {
        name: &'a str,
        file_name: Option<&'a str>,
        data: &'a [u8],
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part.file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
            }
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn file_part<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
        Part {
            name: "file",
            file_name: Some(file_name),
            data,
        }
    }

    fn multipart_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mic")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn test_app(upload_dir: &Path, max_upload_size: usize) -> Router {
        let mut config = Config::default();
        config.upload.dir = upload_dir.to_path_buf();
        config.upload.max_size = max_upload_size;
        crate::routes::app(AppState::new(config))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn stored_names(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_upload_stores_file() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let body = multipart_body(&[file_part("a.txt", b"hello")]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"message": "File \"a.txt\" uploaded successfully"}));
        assert_eq!(tokio::fs::read(temp_dir.path().join("a.txt")).await.unwrap(), b"hello");
        assert_eq!(stored_names(temp_dir.path()).await, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let body = multipart_body(&[Part {
            name: "note",
            file_name: None,
            data: b"just text",
        }]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "No 'file' field in form"}));
        assert!(stored_names(temp_dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_file_field_without_filename_is_not_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let body = multipart_body(&[Part {
            name: "file",
            file_name: None,
            data: b"form value",
        }]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "No 'file' field in form"}));
    }

    #[tokio::test]
    async fn test_non_multipart_request() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let request = Request::builder()
            .method("POST")
            .uri("/mic")
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from("raw bytes"))
            .unwrap();
        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "No 'file' field in form"}));
        assert!(stored_names(temp_dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_filename() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let body = multipart_body(&[file_part("", b"data")]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Empty filename"}));
        assert!(stored_names(temp_dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_path_traversal_is_confined() {
        let temp_dir = TempDir::new().unwrap();
        let upload_dir = temp_dir.path().join("uploads");
        tokio::fs::create_dir(&upload_dir).await.unwrap();
        let app = test_app(&upload_dir, 1024);

        let body = multipart_body(&[file_part("../../etc/passwd", b"root:x:0:0")]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"message": "File \"passwd\" uploaded successfully"}));
        assert_eq!(stored_names(&upload_dir).await, vec!["passwd"]);
        assert_eq!(stored_names(temp_dir.path()).await, vec!["uploads"]);
    }

    #[tokio::test]
    async fn test_repeat_upload_overwrites() {
        let temp_dir = TempDir::new().unwrap();

        for payload in [&b"first take, a bit longer"[..], &b"second"[..], &b"second"[..]] {
            let app = test_app(temp_dir.path(), 1024);
            let body = multipart_body(&[file_part("take.wav", payload)]);
            let (status, _) = send(app, multipart_request(body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(
            tokio::fs::read(temp_dir.path().join("take.wav")).await.unwrap(),
            b"second"
        );
        assert_eq!(stored_names(temp_dir.path()).await, vec!["take.wav"]);
    }

    #[tokio::test]
    async fn test_first_file_part_wins() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let body = multipart_body(&[
            Part {
                name: "comment",
                file_name: None,
                data: b"ignored",
            },
            file_part("one.txt", b"1"),
            file_part("two.txt", b"2"),
        ]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"message": "File \"one.txt\" uploaded successfully"}));
        assert_eq!(stored_names(temp_dir.path()).await, vec!["one.txt"]);
    }

    #[tokio::test]
    async fn test_unsafe_only_filename_uses_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let body = multipart_body(&[file_part("???", b"data")]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"message": "File \"upload\" uploaded successfully"}));
        assert_eq!(tokio::fs::read(temp_dir.path().join("upload")).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_long_filename_is_truncated_and_stored() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let long_name = format!("{}.wav", "a".repeat(300));
        let body = multipart_body(&[file_part(&long_name, b"x")]);
        let (status, json) = send(app, multipart_request(body)).await;

        let stored = "a".repeat(crate::upload::MAX_FILENAME_LEN);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"message": format!("File \"{}\" uploaded successfully", stored)})
        );
        assert_eq!(stored_names(temp_dir.path()).await, vec![stored.clone()]);
        assert_eq!(tokio::fs::read(temp_dir.path().join(&stored)).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let temp_dir = TempDir::new().unwrap();
        // Upload directory never created
        let app = test_app(&temp_dir.path().join("missing"), 1024);

        let body = multipart_body(&[file_part("a.txt", b"hello")]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({"error": "Failed to save file"}));
        assert!(stored_names(temp_dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 256);

        let payload = vec![7u8; 4096];
        let body = multipart_body(&[file_part("big.bin", &payload)]);
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json, json!({"error": "File too large"}));
        assert!(stored_names(temp_dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_truncated_multipart_body() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path(), 1024);

        let mut body = multipart_body(&[file_part("cut.txt", b"never finished")]);
        // Drop the closing boundary
        body.truncate(body.len() - (BOUNDARY.len() + 8));
        let (status, json) = send(app, multipart_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Malformed multipart form"}));
        assert!(stored_names(temp_dir.path()).await.is_empty());
    }
}

//! Upload types for the `/mic` receiver

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Multipart field carrying the payload
pub const FILE_FIELD: &str = "file";

// ============================================================================
// Response Types
// ============================================================================

/// Body returned for a stored upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

impl UploadResponse {
    /// Success message naming the stored file
    pub fn stored(file_name: &str) -> Self {
        Self {
            message: format!("File \"{}\" uploaded successfully", file_name),
        }
    }
}

/// Body returned for any rejected upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Error Types
// ============================================================================

/// Upload error types
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No 'file' field in form")]
    MissingField,

    #[error("Empty filename")]
    EmptyFilename,

    #[error("Malformed multipart form: {0}")]
    MalformedForm(String),

    #[error("File too large")]
    TooLarge,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField => StatusCode::BAD_REQUEST,
            Self::EmptyFilename => StatusCode::BAD_REQUEST,
            Self::MalformedForm(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Storage details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingField => "No 'file' field in form",
            Self::EmptyFilename => "Empty filename",
            Self::MalformedForm(_) => "Malformed multipart form",
            Self::TooLarge => "File too large",
            Self::Storage(_) => "Failed to save file",
        }
    }
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge
        } else {
            Self::MalformedForm(err.body_text())
        }
    }
}

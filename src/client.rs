//! Upload client
//!
//! Sends a local file to a receiver, either as the multipart form `/mic`
//! expects or as a raw request body.

use std::io;
use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use crate::upload::FILE_FIELD;

/// Receiver endpoint on the default port
pub const DEFAULT_URL: &str = "http://localhost:8888/mic";

/// How the file is put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMode {
    /// multipart/form-data with a single file part under `field`
    Multipart { field: String },
    /// File bytes as the whole body, with an optional Content-Type
    Raw { content_type: Option<String> },
}

impl Default for SendMode {
    fn default() -> Self {
        SendMode::Multipart {
            field: FILE_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendOptions {
    pub path: PathBuf,
    pub url: String,
    pub mode: SendMode,
}

impl SendOptions {
    /// Multipart upload of `path` to the default receiver
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            url: DEFAULT_URL.to_string(),
            mode: SendMode::default(),
        }
    }
}

/// What the server answered, whatever the status
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Read `options.path` and POST it to `options.url`.
pub async fn send_file(options: &SendOptions) -> Result<SendOutcome, ClientError> {
    let data = tokio::fs::read(&options.path)
        .await
        .map_err(|source| ClientError::Read {
            path: options.path.clone(),
            source,
        })?;

    tracing::debug!(
        path = %options.path.display(),
        url = %options.url,
        bytes = data.len(),
        mode = ?options.mode,
        "Sending file"
    );

    let client = reqwest::Client::new();
    let request = match &options.mode {
        SendMode::Multipart { field } => {
            let part = Part::bytes(data).file_name(upload_name(&options.path));
            client
                .post(&options.url)
                .multipart(Form::new().part(field.clone(), part))
        }
        SendMode::Raw { content_type } => {
            let request = client.post(&options.url).body(data);
            match content_type {
                Some(content_type) => request.header(CONTENT_TYPE, content_type.as_str()),
                None => request,
            }
        }
    };

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    Ok(SendOutcome { status, body })
}

/// Filename announced in the multipart part: the local base name
fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//! Error types for the Mic Receiver server process
//!
//! Per-request failures live in [`crate::upload::UploadError`] and are turned
//! into HTTP responses. The errors here abort startup instead.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Process-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Startup and serving errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to prepare upload directory {}: {source}", path.display())]
    UploadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] io::Error),
}

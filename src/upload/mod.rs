//! Upload Module
//!
//! Everything the `/mic` receiver needs below the HTTP layer:
//! - Filename sanitization for untrusted client names
//! - A flat on-disk store with write-then-rename semantics
//! - Request/response and error types

pub mod filename;
pub mod store;
pub mod types;

pub use filename::{sanitize_filename, FALLBACK_FILENAME, MAX_FILENAME_LEN};
pub use store::{PendingFile, UploadStore};
pub use types::*;

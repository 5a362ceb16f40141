//! Upload Store
//!
//! Flat directory of received files. Payloads are streamed into a hidden
//! temporary sibling and renamed over the destination once complete, so a
//! reader never sees a half-written file and concurrent writers to the same
//! name never interleave bytes. The last rename wins.
//!
//! Temporary names are `.<uuid>.part`, a fixed 39 bytes whatever the length of
//! the destination name. Stored names never start with `.`, so the two can't
//! collide.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Suffix of in-progress uploads
const PART_SUFFIX: &str = "part";

/// Local filesystem upload store
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Upload directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    ///
    /// Called once at startup, never per request.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Final location for an already sanitized file name
    pub fn destination(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Open a temporary file that will become `file_name` on commit.
    pub async fn begin(&self, file_name: &str) -> io::Result<PendingFile> {
        let temp_path = self
            .root
            .join(format!(".{}.{}", Uuid::new_v4().simple(), PART_SUFFIX));
        let file = File::create(&temp_path).await?;

        tracing::debug!(
            temp_path = %temp_path.display(),
            file_name = %file_name,
            "Opened temporary upload file"
        );

        Ok(PendingFile {
            file: Some(file),
            temp_path: Some(temp_path),
            dest_path: self.destination(file_name),
            written: 0,
        })
    }
}

/// An upload being written.
///
/// Dropping it without calling [`PendingFile::commit`] deletes the temporary
/// file, which covers validation failures, stream errors and clients that
/// hang up mid-request.
#[derive(Debug)]
pub struct PendingFile {
    file: Option<File>,
    temp_path: Option<PathBuf>,
    dest_path: PathBuf,
    written: u64,
}

impl PendingFile {
    /// Append a chunk of payload
    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "upload already finished"))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush to disk and move into place, replacing any previous file.
    ///
    /// Returns the final path.
    pub async fn commit(mut self) -> io::Result<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }

        if let Some(temp_path) = self.temp_path.as_ref() {
            fs::rename(temp_path, &self.dest_path).await?;
        }
        // Renamed; nothing left for Drop to clean up
        self.temp_path = None;

        Ok(self.dest_path.clone())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        // Close the handle before unlinking
        drop(self.file.take());

        // Drop can't await. A single unlink is cheap enough to block the
        // worker for, and it also runs when the request future is cancelled.
        if let Some(temp_path) = self.temp_path.take() {
            match std::fs::remove_file(&temp_path) {
                Ok(()) => tracing::debug!(
                    temp_path = %temp_path.display(),
                    "Discarded unfinished upload"
                ),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    temp_path = %temp_path.display(),
                    error = %e,
                    "Failed to remove unfinished upload"
                ),
            }
        }
    }
}

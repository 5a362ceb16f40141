//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::upload::UploadStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub store: UploadStore,
}

impl AppState {
    /// Create a new application state
    ///
    /// The upload directory comes from `config.upload.dir`. It is not created
    /// here; see [`UploadStore::ensure_dir`].
    pub fn new(config: Config) -> Self {
        let store = UploadStore::new(config.upload.dir.clone());

        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload store
    pub fn store(&self) -> &UploadStore {
        &self.inner.store
    }
}

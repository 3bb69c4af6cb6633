//! Scheme-based dispatch across storage backends
//!
//! The router is the single [`StorageBackend`] handed to the staging and
//! driver layers: plain paths and `file://` go to [`LocalStorage`], every
//! other scheme to whichever backend was registered for it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use job_core::{Error, Location, Result};

use crate::{LocalStorage, StorageBackend};

/// Dispatching storage backend
#[derive(Clone, Default)]
pub struct StorageRouter {
    local: LocalStorage,
    remotes: HashMap<String, Arc<dyn StorageBackend>>,
}

impl StorageRouter {
    /// Create a router that only knows local locations
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend for a remote scheme (e.g. `"s3"`)
    ///
    /// Returns `self` for chaining at construction time.
    pub fn with_backend(mut self, scheme: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
        self.remotes.insert(scheme.into(), backend);
        self
    }

    /// Create a router with an S3 backend built from settings
    #[cfg(feature = "s3")]
    pub async fn with_s3(settings: job_core::S3Settings) -> Self {
        let s3 = crate::S3Storage::new(settings).await;
        Self::new().with_backend("s3", Arc::new(s3))
    }

    /// Find the backend responsible for a location
    fn route(&self, location: &Location) -> Result<&dyn StorageBackend> {
        match location.scheme() {
            None | Some("file") => Ok(&self.local),
            Some(scheme) => self
                .remotes
                .get(scheme)
                .map(|b| b.as_ref())
                .ok_or_else(|| Error::StorageUnavailable {
                    backend: scheme.to_string(),
                }),
        }
    }
}

#[async_trait]
impl StorageBackend for StorageRouter {
    fn direct_access(&self, location: &Location) -> Option<PathBuf> {
        self.route(location).ok()?.direct_access(location)
    }

    async fn read(&self, location: &Location) -> Result<Bytes> {
        self.route(location)?.read(location).await
    }

    async fn download_file(&self, location: &Location, dest: &Path) -> Result<()> {
        self.route(location)?.download_file(location, dest).await
    }

    async fn download_folder(&self, location: &Location, dest_dir: &Path) -> Result<()> {
        self.route(location)?.download_folder(location, dest_dir).await
    }

    async fn upload_folder(&self, src_dir: &Path, location: &Location) -> Result<()> {
        self.route(location)?.upload_folder(src_dir, location).await
    }

    async fn list(&self, location: &Location) -> Result<Vec<Location>> {
        self.route(location)?.list(location).await
    }

    async fn delete(&self, location: &Location) -> Result<()> {
        self.route(location)?.delete(location).await
    }
}

//! Input file staging
//!
//! Data files may be declared relative to the configuration location and
//! may live remotely. Remote inputs are downloaded once into a
//! fetcher-owned cache directory; the cache lives outside the workspace so
//! finalization never uploads it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use job_core::{Error, Location, Result};
use staging::resolve;
use storage::StorageBackend;
use tempfile::TempDir;
use tracing::debug;

/// Fetches input files to local paths
pub struct InputFetcher {
    storage: Arc<dyn StorageBackend>,
    origin: Option<Location>,
    cache: TempDir,
    counter: AtomicU64,
}

impl InputFetcher {
    /// Create a fetcher resolving against the given config origin
    pub fn new(storage: Arc<dyn StorageBackend>, origin: Option<Location>) -> Result<Self> {
        Ok(Self {
            storage,
            origin,
            cache: TempDir::new().map_err(Error::Io)?,
            counter: AtomicU64::new(0),
        })
    }

    /// Resolve a target and return a local path for it
    ///
    /// Direct-access locations are returned as-is; remote ones are
    /// downloaded into the cache.
    pub async fn fetch(&self, target: &str) -> Result<PathBuf> {
        let location = resolve(target, self.origin.as_ref());

        if let Some(path) = self.storage.direct_access(&location) {
            return Ok(path);
        }

        let file_name = location
            .as_str()
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("input");
        let slot = self.counter.fetch_add(1, Ordering::Relaxed);
        let dest = self.cache.path().join(slot.to_string()).join(file_name);

        debug!(location = %location, ?dest, "Fetching input file");
        self.storage.download_file(&location, &dest).await?;
        Ok(dest)
    }

    /// Fetch a sequence of targets, preserving order
    pub async fn fetch_all<S: AsRef<str>>(&self, targets: &[S]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(targets.len());
        for target in targets {
            paths.push(self.fetch(target.as_ref()).await?);
        }
        Ok(paths)
    }
}

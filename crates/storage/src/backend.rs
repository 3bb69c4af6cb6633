//! Storage backend trait definition
//!
//! Defines the async interface that all storage backends must implement.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use job_core::{Location, Result};

/// Async trait for storage backends
///
/// Implementors provide folder-level copy, listing, and deletion over a
/// class of [`Location`]s. Every operation is idempotent at the granularity
/// of "retry the whole operation": no partial-resume of a single
/// multi-object copy is required. Transient failures are retried a bounded
/// number of times inside the backend; permanent failures (permission,
/// not-found) surface immediately.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Return the local filesystem path when the location's backend is
    /// local-equivalent; `None` for genuinely remote backends
    fn direct_access(&self, location: &Location) -> Option<PathBuf>;

    /// Read a single object into memory
    ///
    /// Intended for small objects such as configuration files.
    ///
    /// # Errors
    /// Returns `StoragePathNotFound` if the object doesn't exist.
    async fn read(&self, location: &Location) -> Result<Bytes>;

    /// Download a single object to `dest`, creating parent directories
    async fn download_file(&self, location: &Location, dest: &Path) -> Result<()>;

    /// Recursively copy all objects under `location` into `dest_dir`,
    /// overwriting existing content
    ///
    /// A location with nothing under it is not an error; the destination
    /// directory is created and left empty.
    async fn download_folder(&self, location: &Location, dest_dir: &Path) -> Result<()>;

    /// Recursively copy the contents of `src_dir` to `location`
    async fn upload_folder(&self, src_dir: &Path, location: &Location) -> Result<()>;

    /// Enumerate all object locations under `location`
    async fn list(&self, location: &Location) -> Result<Vec<Location>>;

    /// Remove a single object or, if `location` denotes a directory-like
    /// prefix, all objects under it
    async fn delete(&self, location: &Location) -> Result<()>;
}

//! Local filesystem storage backend
//!
//! Handles plain paths and `file://` locations. Folder transfers are plain
//! recursive copies, so a "download" and an "upload" are symmetric.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use job_core::{Error, Location, Result};
use tokio::fs;
use tracing::{debug, instrument};

use crate::StorageBackend;

/// Storage backend for locations with direct filesystem access
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a new LocalStorage instance
    pub fn new() -> Self {
        Self
    }

    /// Resolve a location to its filesystem path
    fn resolve(&self, location: &Location) -> Result<PathBuf> {
        location.direct_access().ok_or_else(|| Error::Storage {
            message: format!("not a local location: {}", location),
        })
    }

    /// Recursively copy `src` into `dst`, overwriting files that exist
    ///
    /// A missing `src` is treated as an empty source; `dst` is still
    /// created so callers always get a usable directory.
    async fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
        fs::create_dir_all(dst).await.map_err(|e| Error::Storage {
            message: format!("failed to create {:?}: {}", dst, e),
        })?;

        if fs::metadata(src).await.is_err() {
            debug!(?src, "Source missing, nothing to copy");
            return Ok(());
        }

        let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];
        while let Some((from, to)) = stack.pop() {
            let mut entries = fs::read_dir(&from).await.map_err(|e| Error::Storage {
                message: format!("failed to read {:?}: {}", from, e),
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let entry_from = entry.path();
                let entry_to = to.join(entry.file_name());
                let file_type = entry.file_type().await.map_err(Error::Io)?;

                if file_type.is_dir() {
                    fs::create_dir_all(&entry_to).await.map_err(Error::Io)?;
                    stack.push((entry_from, entry_to));
                } else if file_type.is_file() {
                    fs::copy(&entry_from, &entry_to)
                        .await
                        .map_err(|e| Error::Storage {
                            message: format!(
                                "failed to copy {:?} to {:?}: {}",
                                entry_from, entry_to, e
                            ),
                        })?;
                }
            }
        }

        Ok(())
    }

    /// Map an I/O error on `path` to the storage error taxonomy
    fn classify(path: &Path, e: std::io::Error) -> Error {
        match e.kind() {
            std::io::ErrorKind::NotFound => Error::StoragePathNotFound {
                path: path.to_string_lossy().into_owned(),
            },
            std::io::ErrorKind::PermissionDenied => Error::StorageDenied {
                path: path.to_string_lossy().into_owned(),
            },
            _ => Error::Storage {
                message: format!("{:?}: {}", path, e),
            },
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn direct_access(&self, location: &Location) -> Option<PathBuf> {
        location.direct_access()
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn read(&self, location: &Location) -> Result<Bytes> {
        let path = self.resolve(location)?;
        debug!(?path, "Reading file");

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) => Err(Self::classify(&path, e)),
        }
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn download_file(&self, location: &Location, dest: &Path) -> Result<()> {
        let src = self.resolve(location)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        fs::copy(&src, dest)
            .await
            .map_err(|e| Self::classify(&src, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn download_folder(&self, location: &Location, dest_dir: &Path) -> Result<()> {
        let src = self.resolve(location)?;
        debug!(?src, ?dest_dir, "Copying folder from location");
        Self::copy_tree(&src, dest_dir).await
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn upload_folder(&self, src_dir: &Path, location: &Location) -> Result<()> {
        let dst = self.resolve(location)?;
        debug!(?src_dir, ?dst, "Copying folder to location");
        Self::copy_tree(src_dir, &dst).await
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn list(&self, location: &Location) -> Result<Vec<Location>> {
        let root = self.resolve(location)?;
        let mut results = Vec::new();

        if fs::metadata(&root).await.is_err() {
            return Ok(results);
        }

        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };

            while let Ok(Some(entry)) = entries.next_entry().await {
                let entry_path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(t) => t,
                    Err(_) => continue,
                };

                if file_type.is_dir() {
                    stack.push(entry_path);
                } else if file_type.is_file() {
                    results.push(Location::from_path(&entry_path));
                }
            }
        }

        results.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        debug!(count = results.len(), "Found files");
        Ok(results)
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn delete(&self, location: &Location) -> Result<()> {
        let path = self.resolve(location)?;
        debug!(?path, "Deleting");

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Self::classify(&path, e))?;

        let result = if metadata.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        result.map_err(|e| Self::classify(&path, e))
    }
}

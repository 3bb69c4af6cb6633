//! S3 storage backend
//!
//! Provides async S3-compatible folder staging with:
//! - Exponential backoff retry logic for transient failures
//! - Custom endpoint support (for MinIO, LocalStack, etc.)
//!
//! The bucket is taken from each location's authority, so one client serves
//! every `s3://` location a job touches.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Builder as S3ConfigBuilder, primitives::ByteStream, Client};
use bytes::Bytes;
use job_core::{Error, Location, Result, S3Settings};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::StorageBackend;

/// S3-compatible storage backend
///
/// Supports Amazon S3 and S3-compatible services like MinIO.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    settings: S3Settings,
}

impl S3Storage {
    /// Create a new S3Storage from settings
    ///
    /// Uses environment variables or instance profile for credentials.
    pub async fn new(settings: S3Settings) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(
                settings
                    .region
                    .clone()
                    .unwrap_or_else(|| "us-east-1".to_string()),
            ))
            .load()
            .await;

        let mut builder = S3ConfigBuilder::from(&aws_config);

        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        Self { client, settings }
    }

    /// Split a location into bucket and key
    fn parts(location: &Location) -> Result<(String, String)> {
        let (bucket, key) = location.remote_parts()?;
        Ok((bucket.to_string(), key.to_string()))
    }

    /// Classify an SDK error by its rendered service code
    fn classify(location: &Location, context: &str, e: impl std::fmt::Display) -> Error {
        let rendered = e.to_string();
        if rendered.contains("NoSuchKey") || rendered.contains("NotFound") {
            Error::StoragePathNotFound {
                path: location.to_string(),
            }
        } else if rendered.contains("AccessDenied") || rendered.contains("Forbidden") {
            Error::StorageDenied {
                path: location.to_string(),
            }
        } else {
            Error::Storage {
                message: format!("{} failed for {}: {}", context, location, rendered),
            }
        }
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.settings.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..max_retries {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    }

                    let delay = Duration::from_millis(
                        self.settings.retry_base_delay_ms * (1 << attempt),
                    );
                    warn!(
                        %operation,
                        attempt = attempt + 1,
                        max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Storage {
            message: format!("{} failed after {} retries", operation, max_retries),
        }))
    }

    /// Enumerate all object keys under a prefix, paginated
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| Error::Storage {
                message: format!("S3 list_objects failed: {}", e),
            })?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(keys)
    }

    /// Fetch a single object into a local file
    async fn get_to_file(&self, location: &Location, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }

        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::classify(location, "S3 get_object", e))?;

        let mut body = result.body.into_async_read();
        let mut file = fs::File::create(dest).await.map_err(Error::Io)?;
        tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(|e| Error::Storage {
                message: format!("failed to stream {} to {:?}: {}", location, dest, e),
            })?;
        file.flush().await.map_err(Error::Io)?;
        Ok(())
    }

    /// Collect every file under `dir` with its path relative to `dir`
    async fn walk_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut stack = vec![dir.to_path_buf()];

        while let Some(current) = stack.pop() {
            let mut entries = fs::read_dir(&current).await.map_err(Error::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(Error::Io)?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    let rel = path
                        .strip_prefix(dir)
                        .map_err(|_| Error::Storage {
                            message: format!("path {:?} escapes {:?}", path, dir),
                        })?
                        .to_string_lossy()
                        .replace('\\', "/");
                    files.push((path, rel));
                }
            }
        }

        Ok(files)
    }
}

/// The listing prefix for a directory-like key: empty stays empty, anything
/// else gets a trailing slash so `run1` does not match `run10/...`
fn folder_prefix(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!("{}/", key.trim_end_matches('/'))
    }
}

/// Join a key prefix and a relative object path
fn join_key(prefix: &str, rel: &str) -> String {
    if prefix.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), rel)
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn direct_access(&self, _location: &Location) -> Option<PathBuf> {
        None
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn read(&self, location: &Location) -> Result<Bytes> {
        let (bucket, key) = Self::parts(location)?;
        debug!(%bucket, %key, "Reading from S3");

        self.with_retry("read", || async {
            let result = self
                .client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Self::classify(location, "S3 get_object", e))?;

            let bytes = result.body.collect().await.map_err(|e| Error::Storage {
                message: format!("failed to read S3 response body: {}", e),
            })?;

            Ok(Bytes::from(bytes.to_vec()))
        })
        .await
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn download_file(&self, location: &Location, dest: &Path) -> Result<()> {
        let (bucket, key) = Self::parts(location)?;
        debug!(%bucket, %key, ?dest, "Downloading object");

        self.with_retry("download_file", || async {
            self.get_to_file(location, &bucket, &key, dest).await
        })
        .await
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn download_folder(&self, location: &Location, dest_dir: &Path) -> Result<()> {
        let (bucket, key) = Self::parts(location)?;
        let scheme = location.scheme().unwrap_or("s3");
        let prefix = folder_prefix(&key);

        fs::create_dir_all(dest_dir).await.map_err(Error::Io)?;

        let keys = self
            .with_retry("list", || self.list_keys(&bucket, &prefix))
            .await?;
        debug!(%bucket, %prefix, count = keys.len(), "Downloading folder");

        for object_key in keys {
            let rel = object_key.strip_prefix(&prefix).unwrap_or(&object_key);
            if rel.is_empty() {
                continue;
            }
            let dest = dest_dir.join(rel);
            let object_location =
                Location::new(format!("{}://{}/{}", scheme, bucket, object_key));
            self.with_retry("download_folder", || async {
                self.get_to_file(&object_location, &bucket, &object_key, &dest)
                    .await
            })
            .await?;
        }

        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn upload_folder(&self, src_dir: &Path, location: &Location) -> Result<()> {
        let (bucket, key) = Self::parts(location)?;
        let files = Self::walk_files(src_dir).await?;
        debug!(%bucket, %key, count = files.len(), "Uploading folder");

        for (path, rel) in files {
            let object_key = join_key(&key, &rel);
            self.with_retry("upload_folder", || async {
                let body = ByteStream::from_path(&path).await.map_err(|e| Error::Storage {
                    message: format!("failed to open {:?}: {}", path, e),
                })?;

                self.client
                    .put_object()
                    .bucket(&bucket)
                    .key(&object_key)
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| Self::classify(location, "S3 put_object", e))?;

                Ok(())
            })
            .await?;
        }

        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn list(&self, location: &Location) -> Result<Vec<Location>> {
        let (bucket, key) = Self::parts(location)?;
        let scheme = location.scheme().unwrap_or("s3");
        let prefix = folder_prefix(&key);

        let keys = self
            .with_retry("list", || self.list_keys(&bucket, &prefix))
            .await?;

        Ok(keys
            .into_iter()
            .map(|k| Location::new(format!("{}://{}/{}", scheme, bucket, k)))
            .collect())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, location: &Location) -> Result<()> {
        let (bucket, key) = Self::parts(location)?;

        // An exact object and a directory-like prefix may both exist;
        // remove whichever is present.
        let mut keys = self
            .with_retry("list", || self.list_keys(&bucket, &folder_prefix(&key)))
            .await?;
        if !key.is_empty() {
            keys.push(key.clone());
        }

        for object_key in keys {
            self.with_retry("delete", || async {
                self.client
                    .delete_object()
                    .bucket(&bucket)
                    .key(&object_key)
                    .send()
                    .await
                    .map_err(|e| Self::classify(location, "S3 delete_object", e))?;
                Ok(())
            })
            .await?;
        }

        Ok(())
    }
}

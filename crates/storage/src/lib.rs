//! Storage - Pluggable storage backends for the job lifecycle manager
//!
//! Provides async folder-level storage operations with support for:
//! - Local filesystem and `file://` locations (default feature)
//! - Amazon S3 / S3-compatible storage (with `s3` feature)
//!
//! All backends speak in terms of [`job_core::Location`]s, so the staging
//! and finalization layers never branch on where an output actually lives.
//!
//! # Example
//!
//! ```no_run
//! use storage::{LocalStorage, StorageBackend};
//! use job_core::Location;
//!
//! # async fn example() -> job_core::Result<()> {
//! let storage = LocalStorage::new();
//! let out = Location::new("/tmp/run1");
//! storage.upload_folder("/tmp/workspace".as_ref(), &out).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod local;
mod router;

#[cfg(feature = "s3")]
mod s3;

pub use backend::StorageBackend;
pub use local::LocalStorage;
pub use router::StorageRouter;

#[cfg(feature = "s3")]
pub use s3::S3Storage;

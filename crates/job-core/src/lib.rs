//! Job Core - Foundation for the training job lifecycle manager
//!
//! Provides the shared location model, error taxonomy, configuration,
//! and logging setup for the output/checkpoint lifecycle crates.

pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod types;

pub use config::{JobConfig, S3Settings, StorageConfig};
pub use error::{Error, Result};
pub use location::Location;
pub use types::{JobId, JobReport, Metrics, Step};

//! Error types for the job lifecycle manager

use thiserror::Error;

/// Result type alias using the lifecycle Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the output/checkpoint lifecycle
#[derive(Error, Debug)]
pub enum Error {
    // Location errors
    #[error("Malformed location: {message}")]
    Resolution { message: String },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Storage backend not available for scheme: {backend}")]
    StorageUnavailable { backend: String },

    #[error("Storage path not found: {path}")]
    StoragePathNotFound { path: String },

    #[error("Storage access denied: {path}")]
    StorageDenied { path: String },

    // Workspace errors
    #[error("Workspace acquisition failed: {message}")]
    WorkspaceAcquisition { message: String },

    #[error(
        "Output directory ({path}) already exists and is not empty. \
         Enable overwrite_output_dir to overcome."
    )]
    OutputDirConflict { path: String },

    // Finalization errors
    #[error("Finalization failed: {message}")]
    Finalization { message: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }

    /// Returns true if this error indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Resolution { .. }
                | Error::InvalidConfig { .. }
                | Error::OutputDirConflict { .. }
                | Error::WorkspaceAcquisition { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

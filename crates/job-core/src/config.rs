//! Job configuration types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for a single training job
///
/// Deserialized from a JSON document that may itself live at a remote
/// location; relative paths inside it are resolved against that location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Output location for the run (local path or remote URL)
    pub output_dir: String,

    /// Log directory; when declared under `output_dir` it is rewritten to
    /// the corresponding path inside the acquired workspace
    #[serde(default)]
    pub logging_dir: Option<String>,

    /// Whether to run training
    #[serde(default)]
    pub do_train: bool,

    /// Whether to run evaluation
    #[serde(default)]
    pub do_eval: bool,

    /// Whether to run prediction
    #[serde(default)]
    pub do_predict: bool,

    /// Allow reuse of a non-empty output directory without resuming
    #[serde(default)]
    pub overwrite_output_dir: bool,

    /// Explicit checkpoint to resume from; takes precedence over detection
    #[serde(default)]
    pub resume_from_checkpoint: Option<String>,

    /// Delete intermediate checkpoints from the workspace after training
    #[serde(default)]
    pub delete_checkpoints_at_end: bool,

    /// Delete stale remote checkpoints before the final upload
    #[serde(default = "default_true")]
    pub prune_remote_checkpoints: bool,

    /// Training data file, possibly relative to the config location
    #[serde(default)]
    pub train_file: Option<String>,

    /// Validation data file, possibly relative to the config location
    #[serde(default)]
    pub validation_file: Option<String>,

    /// Test data file, possibly relative to the config location
    #[serde(default)]
    pub test_file: Option<String>,

    /// Storage backend settings
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_true() -> bool {
    true
}

impl JobConfig {
    /// Parse a configuration from JSON bytes
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: JobConfig = serde_json::from_slice(data)?;
        Ok(config)
    }

    /// When no phase was requested, enable all of them
    ///
    /// Matches the driver convention that a config without explicit phase
    /// flags means "run the whole pipeline".
    pub fn apply_phase_defaults(&mut self) {
        if !self.do_train && !self.do_eval && !self.do_predict {
            self.do_train = true;
            self.do_eval = true;
            self.do_predict = true;
        }
    }

    /// Validate the configuration before the job starts
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.is_empty() {
            return Err(Error::InvalidConfig {
                message: "output_dir must not be empty".to_string(),
            });
        }
        if self.do_train && self.train_file.is_none() {
            // Training data may also come from a dataset registry owned by
            // the training collaborator, so this is only a warning.
            tracing::warn!("do_train requested without train_file");
        }
        Ok(())
    }
}

/// Storage backend settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3 settings, used when an `s3://` output or input is configured
    #[serde(default)]
    pub s3: S3Settings,
}

/// S3 connection and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    /// Optional custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,

    /// AWS region (default: "us-east-1")
    pub region: Option<String>,

    /// Force path-style addressing (required for MinIO)
    pub force_path_style: bool,

    /// Maximum retry attempts for transient failures
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    pub retry_base_delay_ms: u64,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            region: Some("us-east-1".to_string()),
            force_path_style: false,
            max_retries: 3,
            retry_base_delay_ms: 100,
        }
    }
}

//! Interface to the external training collaborator
//!
//! The collaborator owns models, tokenization, datasets, and metric
//! computation. This subsystem only hands it a local workspace path and an
//! optional checkpoint to resume from, and expects checkpoint entries named
//! `checkpoint-<step>` to appear as immediate subdirectories of the
//! workspace during training.

use std::path::Path;

use async_trait::async_trait;
use job_core::{Metrics, Result};

/// Parameters for a training run
#[derive(Debug, Clone, Copy)]
pub struct TrainSession<'a> {
    /// Local directory the trainer writes checkpoints and artifacts into
    pub workspace: &'a Path,

    /// Log directory, already rewritten to live under the workspace when
    /// it was declared under the output directory
    pub logging_dir: Option<&'a Path>,

    /// Checkpoint directory to resume from, if any
    pub resume_from: Option<&'a Path>,
}

/// Output of a prediction run
#[derive(Debug, Clone)]
pub struct PredictOutput {
    /// Prediction metrics
    pub metrics: Metrics,

    /// Generated predictions, one per input sample
    pub predictions: Vec<String>,
}

/// The external training collaborator
#[async_trait]
pub trait Trainer: Send + Sync {
    /// Run training in the workspace, optionally resuming
    async fn train(&self, session: TrainSession<'_>) -> Result<Metrics>;

    /// Evaluate the model in the workspace
    async fn evaluate(&self, workspace: &Path) -> Result<Metrics>;

    /// Run prediction with the model in the workspace
    async fn predict(&self, workspace: &Path) -> Result<PredictOutput>;
}

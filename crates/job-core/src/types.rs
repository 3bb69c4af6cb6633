//! Core type definitions for the job lifecycle manager

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique job identifier
pub type JobId = String;

/// Training step counter
pub type Step = u64;

/// Named scalar metrics reported by a job phase
pub type Metrics = BTreeMap<String, f64>;

/// Summary of a completed (or failed) job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Unique job identifier
    pub job_id: JobId,

    /// Timestamp when the job started
    pub started_at: DateTime<Utc>,

    /// Timestamp when the job finished
    pub finished_at: Option<DateTime<Utc>>,

    /// Whether the workspace was mirrored from a remote output location
    pub workspace_mirrored: bool,

    /// Metrics from the training phase
    pub train: Option<Metrics>,

    /// Metrics from the evaluation phase
    pub eval: Option<Metrics>,

    /// Metrics from the prediction phase
    pub predict: Option<Metrics>,
}

impl JobReport {
    /// Start a new report with a generated job id
    pub fn new(workspace_mirrored: bool) -> Self {
        Self {
            job_id: format!("job-{}", Uuid::new_v4()),
            started_at: Utc::now(),
            finished_at: None,
            workspace_mirrored,
            train: None,
            eval: None,
            predict: None,
        }
    }

    /// Stamp the completion time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

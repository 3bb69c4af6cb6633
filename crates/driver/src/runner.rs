//! Job runner
//!
//! Carries one job through its whole lifecycle: resolve the output
//! location, acquire a workspace, decide on resumption, run the requested
//! phases, and finalize. Finalization runs no matter which exit path the
//! job takes; an error in a phase must never leak a staged mirror or skip
//! the sync back to the output location.

use std::path::PathBuf;
use std::sync::Arc;

use job_core::{Error, JobConfig, JobReport, Location, Result};
use staging::{
    prune_checkpoints, rebase_dependent, resolve, resume_decision, Finalizer, ResumeDecision,
    StagingManager, Workspace,
};
use storage::StorageBackend;
use tokio::fs;
use tracing::{error, info};

use crate::inputs::InputFetcher;
use crate::trainer::{Trainer, TrainSession};

/// Load a job configuration, locally or remotely
///
/// The configuration's own location becomes the job's config origin:
/// relative locations inside it are resolved against it.
pub async fn load_job(
    config_location: &str,
    storage: &dyn StorageBackend,
) -> Result<(JobConfig, Option<Location>)> {
    let location = Location::new(config_location);
    let data = storage.read(&location).await?;
    let config = JobConfig::from_json(&data)?;
    Ok((config, Some(location)))
}

/// Runs one training job against an external trainer
///
/// This is the job's context object: configuration, config origin, and
/// storage are set up once at job start and passed down explicitly.
pub struct JobRunner {
    config: JobConfig,
    origin: Option<Location>,
    storage: Arc<dyn StorageBackend>,
}

impl JobRunner {
    /// Create a runner, applying phase defaults and validating the config
    pub fn new(
        mut config: JobConfig,
        origin: Option<Location>,
        storage: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        config.apply_phase_defaults();
        config.validate()?;
        Ok(Self {
            config,
            origin,
            storage,
        })
    }

    /// The effective job configuration
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// An input fetcher bound to this job's origin and storage
    pub fn input_fetcher(&self) -> Result<InputFetcher> {
        InputFetcher::new(self.storage.clone(), self.origin.clone())
    }

    /// Run the job to completion
    ///
    /// The workspace is finalized on success and failure paths alike. A
    /// phase error wins over a finalization error; a finalization error
    /// alone fails an otherwise successful job.
    pub async fn run(&self, trainer: &dyn Trainer) -> Result<JobReport> {
        let output = resolve(&self.config.output_dir, self.origin.as_ref());
        info!(output = %output, "Starting job");

        let manager = StagingManager::new(self.storage.clone());
        let workspace = manager.acquire(&output).await?;

        let result = self.execute(trainer, &workspace).await;

        let finalizer = Finalizer::new(
            self.storage.clone(),
            self.config.prune_remote_checkpoints,
        );
        let finalized = finalizer.finalize(workspace).await;

        match (result, finalized) {
            (Ok(mut report), Ok(())) => {
                report.finish();
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(finalize_err)) => {
                error!(error = %finalize_err, "Finalization also failed");
                Err(e)
            }
        }
    }

    /// Everything between acquisition and finalization
    async fn execute(&self, trainer: &dyn Trainer, workspace: &Workspace) -> Result<JobReport> {
        let config = &self.config;
        let mut report = JobReport::new(workspace.is_mirrored());

        // A log dir declared under the output dir follows the workspace
        let logging_dir: Option<PathBuf> = config.logging_dir.as_deref().map(|declared| {
            match rebase_dependent(declared, &config.output_dir, workspace.path()) {
                Some(rebased) => PathBuf::from(rebased),
                None => PathBuf::from(declared),
            }
        });

        let detected = resume_decision(
            workspace.path(),
            config.do_train,
            config.overwrite_output_dir,
        )
        .await?;
        let resume_from: Option<PathBuf> = match (&config.resume_from_checkpoint, detected) {
            (Some(explicit), _) => {
                info!(checkpoint = %explicit, "Using explicit resume target");
                Some(PathBuf::from(explicit))
            }
            (None, ResumeDecision::ResumeFrom(entry)) => Some(entry.path),
            (None, ResumeDecision::FreshStart) => None,
        };

        if config.do_train {
            let metrics = trainer
                .train(TrainSession {
                    workspace: workspace.path(),
                    logging_dir: logging_dir.as_deref(),
                    resume_from: resume_from.as_deref(),
                })
                .await?;
            report.train = Some(metrics);

            if config.delete_checkpoints_at_end {
                info!("Deleting checkpoints");
                prune_checkpoints(workspace.path()).await?;
            }
        }

        if config.do_eval {
            info!("*** Evaluate ***");
            report.eval = Some(trainer.evaluate(workspace.path()).await?);
        }

        if config.do_predict {
            info!("*** Predict ***");
            let output = trainer.predict(workspace.path()).await?;

            let prediction_file = workspace.path().join("generated_predictions.txt");
            fs::write(&prediction_file, output.predictions.join("\n"))
                .await
                .map_err(Error::Io)?;
            report.predict = Some(output.metrics);
        }

        Ok(report)
    }
}

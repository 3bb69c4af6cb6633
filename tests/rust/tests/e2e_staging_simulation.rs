//! End-to-end staging simulation
//!
//! Drives a whole job against a remote output location:
//! - relative inputs resolve against the remote config location
//! - the output prefix is mirrored into an ephemeral workspace
//! - the simulated trainer resumes from the staged checkpoint
//! - finalization pre-prunes stale remote checkpoints, uploads the
//!   workspace, and removes the mirror, on failure paths too

use std::sync::Arc;

use driver::{load_job, JobRunner};
use integration_tests::{MockRemote, SimulatedTrainer};
use job_core::{Error, JobConfig};
use staging::resolve;

#[tokio::test]
async fn test_remote_config_resolves_relative_inputs() {
    let remote = MockRemote::new();
    remote.put(
        "bucket/config.json",
        br#"{"output_dir": "run1", "train_file": "data/train.json", "do_train": true}"#,
    );
    remote.put("bucket/data/train.json", b"[]");

    let (config, origin) = load_job("mock://bucket/config.json", &remote).await.unwrap();
    assert_eq!(config.output_dir, "run1");

    let origin = origin.unwrap();
    let train_file = resolve(config.train_file.as_deref().unwrap(), Some(&origin));
    assert_eq!(train_file.as_str(), "mock://bucket/data/train.json");

    let output = resolve(&config.output_dir, Some(&origin));
    assert_eq!(output.as_str(), "mock://bucket/run1");

    // Remote inputs are fetched into a local cache
    let runner = JobRunner::new(config, Some(origin), Arc::new(remote)).unwrap();
    let fetcher = runner.input_fetcher().unwrap();
    let local = fetcher.fetch("data/train.json").await.unwrap();
    assert_eq!(std::fs::read(local).unwrap(), b"[]");
}

#[tokio::test]
async fn test_full_job_against_remote_output() {
    job_core::logging::init();

    let remote = MockRemote::new();
    remote.put(
        "bucket/config.json",
        br#"{"output_dir": "run1", "do_train": true, "do_eval": true, "do_predict": true, "delete_checkpoints_at_end": true}"#,
    );
    // A previous run left a checkpoint and a final model behind
    remote.put("bucket/run1/checkpoint-500/model.bin", b"old intermediate");
    remote.put("bucket/run1/model.bin", b"old weights");

    let (config, origin) = load_job("mock://bucket/config.json", &remote).await.unwrap();
    let runner = JobRunner::new(config, origin, Arc::new(remote.clone())).unwrap();

    let trainer = SimulatedTrainer {
        checkpoint_steps: vec![1000],
        ..Default::default()
    };
    let report = runner.run(&trainer).await.unwrap();

    assert!(report.workspace_mirrored);
    assert_eq!(report.train.as_ref().unwrap()["train_loss"], 0.42);
    assert_eq!(report.eval.as_ref().unwrap()["eval_bleu"], 31.5);

    // The trainer resumed from the staged copy of the remote checkpoint
    let seen = trainer.seen_resume.lock().unwrap().clone().unwrap();
    let resumed = seen.expect("should have resumed");
    assert!(resumed.ends_with("run1/checkpoint-500"));

    // Local pruning plus remote pre-pruning leave no checkpoints behind
    assert!(!remote.exists("bucket/run1/checkpoint-500"));
    assert!(!remote.exists("bucket/run1/checkpoint-1000"));

    // Final artifacts reflect the workspace contents
    assert_eq!(remote.get("bucket/run1/model.bin"), b"final weights");
    assert!(remote.exists("bucket/run1/eval_results.json"));
    assert_eq!(
        remote.get("bucket/run1/generated_predictions.txt"),
        b"bonjour\nmonde"
    );

    // The mirror is gone, not just the pruned checkpoint
    let workspace_dir = resumed.parent().unwrap();
    assert!(!workspace_dir.exists());
}

#[tokio::test]
async fn test_checkpoints_survive_round_trip_when_pruning_is_local_only() {
    let remote = MockRemote::new();
    let config = JobConfig::from_json(
        br#"{"output_dir": "mock://bucket/run2", "do_train": true}"#,
    )
    .unwrap();

    let runner = JobRunner::new(config, None, Arc::new(remote.clone())).unwrap();
    let trainer = SimulatedTrainer {
        checkpoint_steps: vec![250, 500],
        ..Default::default()
    };
    runner.run(&trainer).await.unwrap();

    // Without delete_checkpoints_at_end the workspace still holds the
    // checkpoints at upload time, so they land remotely as well
    assert!(remote.exists("bucket/run2/model.bin"));
    assert!(remote.exists("bucket/run2/checkpoint-250/model.bin"));
    assert!(remote.exists("bucket/run2/checkpoint-500/optimizer.bin"));
}

#[tokio::test]
async fn test_trainer_failure_still_finalizes() {
    use async_trait::async_trait;
    use driver::{PredictOutput, TrainSession, Trainer};
    use job_core::{Metrics, Result};
    use std::path::Path;

    struct ExplodingTrainer;

    #[async_trait]
    impl Trainer for ExplodingTrainer {
        async fn train(&self, session: TrainSession<'_>) -> Result<Metrics> {
            std::fs::create_dir_all(session.workspace).unwrap();
            std::fs::write(session.workspace.join("partial.bin"), b"partial").unwrap();
            Err(Error::Storage {
                message: "simulated training crash".to_string(),
            })
        }

        async fn evaluate(&self, _workspace: &Path) -> Result<Metrics> {
            unreachable!("evaluation must not run after a training failure")
        }

        async fn predict(&self, _workspace: &Path) -> Result<PredictOutput> {
            unreachable!("prediction must not run after a training failure")
        }
    }

    let remote = MockRemote::new();
    let config = JobConfig::from_json(
        br#"{"output_dir": "mock://bucket/run3", "do_train": true, "do_eval": true, "do_predict": true}"#,
    )
    .unwrap();

    let runner = JobRunner::new(config, None, Arc::new(remote.clone())).unwrap();
    let result = runner.run(&ExplodingTrainer).await;

    assert!(matches!(result, Err(Error::Storage { .. })));
    // Partial state was still synced back before the mirror was released
    assert_eq!(remote.get("bucket/run3/partial.bin"), b"partial");
}

#[tokio::test]
async fn test_remote_conflict_detected_after_staging() {
    let remote = MockRemote::new();
    // Remote output holds an unrelated file and no checkpoint
    remote.put("bucket/run4/notes.txt", b"do not overwrite");

    let config = JobConfig::from_json(
        br#"{"output_dir": "mock://bucket/run4", "do_train": true}"#,
    )
    .unwrap();

    let runner = JobRunner::new(config, None, Arc::new(remote.clone())).unwrap();
    let trainer = SimulatedTrainer::default();
    let result = runner.run(&trainer).await;

    assert!(matches!(result, Err(Error::OutputDirConflict { .. })));
    // The conflicting remote content survives finalization untouched
    assert_eq!(remote.get("bucket/run4/notes.txt"), b"do not overwrite");
}

#[tokio::test]
async fn test_prune_remote_checkpoints_can_be_disabled() {
    let remote = MockRemote::new();
    remote.put("bucket/run5/checkpoint-100/model.bin", b"kept");

    let config = JobConfig::from_json(
        br#"{"output_dir": "mock://bucket/run5", "do_train": true, "overwrite_output_dir": true, "prune_remote_checkpoints": false}"#,
    )
    .unwrap();

    let runner = JobRunner::new(config, None, Arc::new(remote.clone())).unwrap();
    let trainer = SimulatedTrainer::default();
    runner.run(&trainer).await.unwrap();

    assert!(remote.exists("bucket/run5/checkpoint-100/model.bin"));
    assert!(remote.exists("bucket/run5/model.bin"));
}

#[tokio::test]
async fn test_logging_dir_under_output_follows_workspace() {
    let remote = MockRemote::new();
    let config = JobConfig::from_json(
        br#"{"output_dir": "mock://bucket/run6", "logging_dir": "mock://bucket/run6/logs", "do_train": true}"#,
    )
    .unwrap();

    let runner = JobRunner::new(config, None, Arc::new(remote.clone())).unwrap();
    let trainer = SimulatedTrainer::default();
    runner.run(&trainer).await.unwrap();

    // The trainer wrote logs into the rebased directory, which finalize
    // then uploaded under the output prefix
    assert_eq!(remote.get("bucket/run6/logs/events.log"), b"training events");
}

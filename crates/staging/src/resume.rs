//! Checkpoint resume detection
//!
//! Checkpoints are immediate subdirectories of the workspace named
//! `checkpoint-<step>`, written by the training collaborator. The naming
//! convention must be preserved exactly; it is the only wire format shared
//! with the collaborator's checkpoint writer.

use std::path::{Path, PathBuf};

use job_core::{Error, Result, Step};
use tokio::fs;
use tracing::{debug, info};

/// Directory-name prefix of checkpoint entries
pub const CHECKPOINT_PREFIX: &str = "checkpoint";

/// A step-numbered checkpoint directory inside a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointEntry {
    /// Path to the checkpoint directory
    pub path: PathBuf,

    /// Step parsed from the directory name; highest is most recent
    pub step: Step,
}

/// The computed choice for how a job begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeDecision {
    /// No prior state to continue from
    FreshStart,

    /// Continue from the most recent checkpoint
    ResumeFrom(CheckpointEntry),
}

/// Parse the step number from a checkpoint directory name
///
/// Returns `None` for anything that is not exactly
/// `checkpoint-<decimal step>`.
pub(crate) fn checkpoint_step(name: &str) -> Option<Step> {
    let digits = name
        .strip_prefix(CHECKPOINT_PREFIX)?
        .strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Find the most recent checkpoint entry in a workspace directory
///
/// Steps are unique by construction (one checkpoint per step); if
/// duplicates ever appear the highest-numbered entry wins
/// deterministically.
pub async fn last_checkpoint(dir: &Path) -> Result<Option<CheckpointEntry>> {
    let mut best: Option<CheckpointEntry> = None;

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
        let name = entry.file_name();
        let Some(step) = checkpoint_step(&name.to_string_lossy()) else {
            continue;
        };
        if !entry.file_type().await.map_err(Error::Io)?.is_dir() {
            continue;
        }
        if best.as_ref().map_or(true, |b| step >= b.step) {
            best = Some(CheckpointEntry {
                path: entry.path(),
                step,
            });
        }
    }

    Ok(best)
}

/// Decide between a fresh start and resuming, or fail on a directory
/// conflict
///
/// The decision is advisory: an explicit resume target supplied by the
/// caller always takes precedence over `ResumeFrom`.
///
/// # Errors
/// Returns [`Error::OutputDirConflict`] when the directory is non-empty,
/// holds no checkpoint, contains at least one regular file, and overwrite
/// was not allowed.
pub async fn resume_decision(
    dir: &Path,
    training_requested: bool,
    overwrite_allowed: bool,
) -> Result<ResumeDecision> {
    if !training_requested || overwrite_allowed {
        return Ok(ResumeDecision::FreshStart);
    }
    if !dir.is_dir() {
        return Ok(ResumeDecision::FreshStart);
    }

    if let Some(entry) = last_checkpoint(dir).await? {
        info!(
            checkpoint = ?entry.path,
            step = entry.step,
            "Checkpoint detected, job will resume from it"
        );
        return Ok(ResumeDecision::ResumeFrom(entry));
    }

    let mut entries = fs::read_dir(dir).await.map_err(Error::Io)?;
    while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
        if entry.file_type().await.map_err(Error::Io)?.is_file() {
            return Err(Error::OutputDirConflict {
                path: dir.to_string_lossy().into_owned(),
            });
        }
    }

    debug!(?dir, "No checkpoint and no conflicting files, starting fresh");
    Ok(ResumeDecision::FreshStart)
}

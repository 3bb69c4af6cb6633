//! Intermediate checkpoint pruning
//!
//! After a terminal state is reached, intermediate checkpoints are dead
//! weight; the final model artifacts, logs, and metrics files next to them
//! are not. Pruning is scoped strictly to the checkpoint naming convention.

use std::path::{Path, PathBuf};

use job_core::{Error, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::resume::checkpoint_step;

/// Delete every checkpoint entry in the workspace directory
///
/// Entries not matching `checkpoint-<step>` are never touched. Safe to
/// call zero or multiple times: a second call finds nothing to delete.
/// Returns the paths that were removed.
pub async fn prune_checkpoints(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(Error::Io(e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
        let name = entry.file_name();
        if checkpoint_step(&name.to_string_lossy()).is_none() {
            continue;
        }
        if !entry.file_type().await.map_err(Error::Io)?.is_dir() {
            continue;
        }

        let path = entry.path();
        debug!(?path, "Deleting checkpoint");
        fs::remove_dir_all(&path).await.map_err(Error::Io)?;
        removed.push(path);
    }

    if !removed.is_empty() {
        info!(count = removed.len(), ?dir, "Pruned checkpoints");
    }
    Ok(removed)
}

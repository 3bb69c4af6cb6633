//! Finalization of mirrored workspaces
//!
//! Runs exactly once per job, on success and failure paths alike: stale
//! remote checkpoints are pruned, the workspace contents are uploaded back
//! to the output location, and the ephemeral staging directory is removed.
//! The removal happens even when the upload fails; an upload error must
//! never leak a staging directory.

use std::sync::Arc;

use job_core::{Error, Location, Result};
use storage::StorageBackend;
use tracing::{debug, info, warn};

use crate::resume::checkpoint_step;
use crate::workspace::Workspace;

/// Synchronizes a workspace back to its output location and releases it
pub struct Finalizer {
    storage: Arc<dyn StorageBackend>,
    prune_remote: bool,
}

impl Finalizer {
    /// Create a finalizer
    ///
    /// `prune_remote` controls whether stale remote checkpoints are deleted
    /// before the upload. Remote pre-pruning is independent of local
    /// checkpoint deletion: it keeps the remote location from retaining
    /// checkpoints that a later staging download would resurrect.
    pub fn new(storage: Arc<dyn StorageBackend>, prune_remote: bool) -> Self {
        Self {
            storage,
            prune_remote,
        }
    }

    /// Finalize the workspace, consuming it
    ///
    /// Direct workspaces need no synchronization and return immediately.
    /// For mirrored workspaces the staging directory is removed no matter
    /// how the synchronization went; a cleanup failure is reported only
    /// when nothing else already failed.
    pub async fn finalize(&self, mut workspace: Workspace) -> Result<()> {
        let Some(staging) = workspace.take_staging() else {
            debug!(path = ?workspace.path(), "Direct workspace, nothing to finalize");
            return Ok(());
        };

        let sync_result = self.sync_back(&workspace).await;
        let cleanup_result = staging.close();

        match sync_result {
            Err(e) => {
                if let Err(cleanup_err) = cleanup_result {
                    warn!(error = %cleanup_err, "Failed to remove staging directory");
                }
                Err(e)
            }
            Ok(()) => cleanup_result.map_err(|e| Error::Finalization {
                message: format!("failed to remove staging directory: {}", e),
            }),
        }
    }

    /// Pre-prune stale remote checkpoints, then upload the workspace
    async fn sync_back(&self, workspace: &Workspace) -> Result<()> {
        let output = workspace.output();

        if self.prune_remote {
            self.prune_remote_checkpoints(output).await?;
        }

        info!(workspace = ?workspace.path(), output = %output, "Uploading workspace");
        self.storage
            .upload_folder(workspace.path(), output)
            .await
            .map_err(|e| Error::Finalization {
                message: format!("failed to upload workspace to {}: {}", output, e),
            })
    }

    /// Delete remote entries under `output` whose first path segment is a
    /// checkpoint directory name
    ///
    /// This runs even when local pruning was skipped or partial, so stale
    /// remote checkpoints are gone before the re-upload.
    async fn prune_remote_checkpoints(&self, output: &Location) -> Result<()> {
        let children = self
            .storage
            .list(output)
            .await
            .map_err(|e| Error::Finalization {
                message: format!("failed to list {}: {}", output, e),
            })?;

        for child in &children {
            let Some(rel) = output
                .relative_suffix(child)
                .and_then(|s| s.strip_prefix('/'))
            else {
                continue;
            };
            let first = rel.split('/').next().unwrap_or("");
            if checkpoint_step(first).is_none() {
                continue;
            }

            debug!(entry = %child, "Deleting stale remote checkpoint object");
            self.storage
                .delete(child)
                .await
                .map_err(|e| Error::Finalization {
                    message: format!("failed to delete {}: {}", child, e),
                })?;
        }

        Ok(())
    }
}

//! Staging workspace acquisition
//!
//! Decides whether a job operates directly on a local output directory or
//! on an ephemeral local mirror of a remote one. Downstream code (the
//! training collaborator, log-directory construction) always sees a local,
//! writable path; this is the only place that knows the difference.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use job_core::{Error, Location, Result};
use storage::StorageBackend;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// The local directory a job actually reads and writes
///
/// Direct workspaces point straight at the resolved output path. Mirrored
/// workspaces own an ephemeral staging directory whose deletion belongs
/// exclusively to the [`crate::Finalizer`]; dropping an unfinalized
/// mirrored workspace is a bug and only triggers best-effort local cleanup,
/// never an upload.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    output: Location,
    staging: Option<TempDir>,
}

impl Workspace {
    /// The local path the job operates on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved output location this workspace stands in for
    pub fn output(&self) -> &Location {
        &self.output
    }

    /// True when the workspace mirrors a remote output location
    pub fn is_mirrored(&self) -> bool {
        self.staging.is_some()
    }

    /// Detach the staging directory for finalization
    pub(crate) fn take_staging(&mut self) -> Option<TempDir> {
        self.staging.take()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(staging) = self.staging.take() {
            warn!(
                path = ?staging.path(),
                output = %self.output,
                "Mirrored workspace dropped without finalization; removing staging directory"
            );
            if let Err(e) = staging.close() {
                warn!(error = %e, "Failed to remove staging directory");
            }
        }
    }
}

/// Acquires workspaces for resolved output locations
pub struct StagingManager {
    storage: Arc<dyn StorageBackend>,
}

impl StagingManager {
    /// Create a manager over the given storage backend
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Acquire a workspace for the resolved output location
    ///
    /// Locations with direct local access are used in place. Remote
    /// locations are mirrored into a fresh ephemeral directory, with the
    /// remote path segment preserved as a subpath so code expecting that
    /// relative layout keeps working.
    pub async fn acquire(&self, output: &Location) -> Result<Workspace> {
        if let Some(path) = self.storage.direct_access(output) {
            debug!(?path, "Output has direct access, using in place");
            return Ok(Workspace {
                path,
                output: output.clone(),
                staging: None,
            });
        }

        let staging = tempfile::Builder::new()
            .prefix("staging-")
            .tempdir()
            .map_err(Error::Io)?;
        let path = staging.path().join(output.key_path());

        info!(output = %output, workspace = ?path, "Mirroring remote output into workspace");
        self.storage
            .download_folder(output, &path)
            .await
            .map_err(|e| Error::WorkspaceAcquisition {
                message: format!("failed to stage {}: {}", output, e),
            })?;

        Ok(Workspace {
            path,
            output: output.clone(),
            staging: Some(staging),
        })
    }
}

/// Rewrite a location declared as a sub-path of the output directory so
/// its relative suffix lands under the acquired workspace
///
/// Returns `None` when `dependent` is not under `declared_base`; the
/// caller then leaves it untouched.
pub fn rebase_dependent(dependent: &str, declared_base: &str, workspace: &Path) -> Option<String> {
    let suffix = dependent.strip_prefix(declared_base)?;
    Some(format!("{}{}", workspace.display(), suffix))
}

//! Shared test support for the integration tests
//!
//! Provides a hermetic remote backend (`mock://` mapped onto a temp
//! directory) and a simulated trainer that behaves like the external
//! collaborator: it writes step-numbered checkpoint directories and final
//! artifacts into whatever workspace it is handed.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use driver::{PredictOutput, TrainSession, Trainer};
use job_core::{Location, Metrics, Result};
use storage::{LocalStorage, StorageBackend};
use tempfile::TempDir;

/// A remote-classified backend backed by a temporary directory
///
/// `mock://authority/key` maps to `<root>/authority/key`, so every staging
/// and finalization flow runs without network access.
#[derive(Clone)]
pub struct MockRemote {
    root: Arc<TempDir>,
    inner: LocalStorage,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            root: Arc::new(TempDir::new().unwrap()),
            inner: LocalStorage::new(),
        }
    }

    /// Seed an object at `authority/key`
    pub fn put(&self, rel: &str, data: &[u8]) {
        let path = self.root.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    /// True when an object (or prefix) exists at `authority/key`
    pub fn exists(&self, rel: &str) -> bool {
        self.root.path().join(rel).exists()
    }

    /// Read an object seeded or uploaded at `authority/key`
    pub fn get(&self, rel: &str) -> Vec<u8> {
        std::fs::read(self.root.path().join(rel)).unwrap()
    }

    fn to_local(&self, location: &Location) -> Result<Location> {
        let (authority, key) = location.remote_parts()?;
        Ok(Location::from_path(
            self.root.path().join(authority).join(key),
        ))
    }

    fn to_remote(&self, path: &Path) -> Location {
        let rel = path
            .strip_prefix(self.root.path())
            .expect("listed path under root")
            .to_string_lossy()
            .replace('\\', "/");
        Location::new(format!("mock://{}", rel))
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MockRemote {
    fn direct_access(&self, _location: &Location) -> Option<PathBuf> {
        None
    }

    async fn read(&self, location: &Location) -> Result<Bytes> {
        self.inner.read(&self.to_local(location)?).await
    }

    async fn download_file(&self, location: &Location, dest: &Path) -> Result<()> {
        self.inner.download_file(&self.to_local(location)?, dest).await
    }

    async fn download_folder(&self, location: &Location, dest_dir: &Path) -> Result<()> {
        self.inner
            .download_folder(&self.to_local(location)?, dest_dir)
            .await
    }

    async fn upload_folder(&self, src_dir: &Path, location: &Location) -> Result<()> {
        self.inner
            .upload_folder(src_dir, &self.to_local(location)?)
            .await
    }

    async fn list(&self, location: &Location) -> Result<Vec<Location>> {
        let listed = self.inner.list(&self.to_local(location)?).await?;
        Ok(listed
            .iter()
            .map(|l| self.to_remote(Path::new(l.as_str())))
            .collect())
    }

    async fn delete(&self, location: &Location) -> Result<()> {
        self.inner.delete(&self.to_local(location)?).await
    }
}

/// Simulates the external training collaborator
#[derive(Default)]
pub struct SimulatedTrainer {
    /// Steps at which to write checkpoint directories during `train`
    pub checkpoint_steps: Vec<u64>,

    /// The resume target observed by the last `train` call
    pub seen_resume: Mutex<Option<Option<PathBuf>>>,
}

#[async_trait]
impl Trainer for SimulatedTrainer {
    async fn train(&self, session: TrainSession<'_>) -> Result<Metrics> {
        *self.seen_resume.lock().unwrap() = Some(session.resume_from.map(Path::to_path_buf));

        std::fs::create_dir_all(session.workspace).unwrap();
        for step in &self.checkpoint_steps {
            let dir = session.workspace.join(format!("checkpoint-{}", step));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("optimizer.bin"), b"optimizer state").unwrap();
            std::fs::write(dir.join("model.bin"), b"intermediate weights").unwrap();
        }
        if let Some(logging_dir) = session.logging_dir {
            std::fs::create_dir_all(logging_dir).unwrap();
            std::fs::write(logging_dir.join("events.log"), b"training events").unwrap();
        }
        std::fs::write(session.workspace.join("model.bin"), b"final weights").unwrap();
        std::fs::write(session.workspace.join("trainer_state.json"), b"{}").unwrap();

        Ok(Metrics::from([("train_loss".to_string(), 0.42)]))
    }

    async fn evaluate(&self, workspace: &Path) -> Result<Metrics> {
        std::fs::write(workspace.join("eval_results.json"), b"{}").unwrap();
        Ok(Metrics::from([("eval_bleu".to_string(), 31.5)]))
    }

    async fn predict(&self, _workspace: &Path) -> Result<PredictOutput> {
        Ok(PredictOutput {
            metrics: Metrics::from([("predict_bleu".to_string(), 29.8)]),
            predictions: vec!["bonjour".to_string(), "monde".to_string()],
        })
    }
}

//! Staging - Output/checkpoint lifecycle for training jobs
//!
//! Owns the path between a job's declared output location and the local
//! directory it actually writes to:
//! - [`resolver`] turns possibly-relative locations into absolute ones
//! - [`StagingManager`] mirrors remote outputs into an ephemeral workspace
//! - [`resume`] detects the most recent checkpoint to continue from
//! - [`prune`] removes intermediate checkpoints after a terminal state
//! - [`Finalizer`] syncs the workspace back and releases the mirror,
//!   on success and failure paths alike

pub mod finalize;
pub mod prune;
pub mod resolver;
pub mod resume;
pub mod workspace;


pub use finalize::Finalizer;
pub use prune::prune_checkpoints;
pub use resolver::{resolve, resolve_all};
pub use resume::{last_checkpoint, resume_decision, CheckpointEntry, ResumeDecision, CHECKPOINT_PREFIX};
pub use workspace::{rebase_dependent, StagingManager, Workspace};

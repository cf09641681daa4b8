//! Durable storage for the workflow document
//!
//! The current document lives at a fixed path. Saves are atomic from a
//! reader's perspective (temp file, fsync, rename). Every mutation is
//! preceded by a timestamped copy in the versions directory so the history
//! of evolved policies survives.

use super::Workflow;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by workflow persistence
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to access workflow document: {0}")]
    Io(#[from] std::io::Error),

    #[error("workflow document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("duplicate step id in workflow document: {0}")]
    DuplicateStepId(String),
}

/// Handle to the workflow document and its versions directory
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    path: PathBuf,
    versions_dir: PathBuf,
}

impl WorkflowStore {
    pub fn new(path: impl Into<PathBuf>, versions_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            versions_dir: versions_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn versions_dir(&self) -> &Path {
        &self.versions_dir
    }

    /// Load the current document from durable storage.
    ///
    /// A missing, unreadable, or malformed document is fatal to the caller's
    /// cycle; load is also where the unique-step-id invariant is enforced.
    pub fn load(&self) -> Result<Workflow, WorkflowError> {
        let data = fs::read(&self.path)?;
        let workflow: Workflow = serde_json::from_slice(&data)?;

        if let Some(id) = workflow.duplicate_step_id() {
            return Err(WorkflowError::DuplicateStepId(id.to_string()));
        }

        Ok(workflow)
    }

    /// Overwrite the document. Concurrent readers see either the old or the
    /// new content, never a partial write.
    pub fn save(&self, workflow: &Workflow) -> Result<(), WorkflowError> {
        let json = serde_json::to_vec_pretty(workflow)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), steps = workflow.steps.len(), "Workflow saved");
        Ok(())
    }

    /// Copy the current on-disk document into the versions directory under
    /// `<UTC timestamp>__<reason>.json`, spaces in the reason replaced with
    /// underscores.
    ///
    /// Must run before `save` applies new content so the copy always
    /// reflects the pre-mutation state. Callers treat failure as non-fatal.
    pub fn snapshot(&self, reason: &str) -> Result<PathBuf, WorkflowError> {
        fs::create_dir_all(&self.versions_dir)?;

        let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let name = format!("{}__{}.json", timestamp, reason.replace(' ', "_"));
        let dest = self.versions_dir.join(name);
        fs::copy(&self.path, &dest)?;

        info!(dest = %dest.display(), "Workflow snapshot saved");
        Ok(dest)
    }
}

//! Run context shared by every action of a flow.
//!
//! - [`FlowContext`] - workspace, resolved env, and shared resources
//! - [`SharedResources`] - lock-guarded key/value hand-off store

pub mod shared;

pub use shared::SharedResources;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Context handed by reference to every action during a flow run.
///
/// One instance per flow run; it outlives every job, group, and action of
/// that run. Actions only read it, except through [`SharedResources`].
#[derive(Debug)]
pub struct FlowContext {
    workspace: PathBuf,
    env: HashMap<String, String>,
    shared: SharedResources,
}

impl FlowContext {
    /// Create a context rooted at `workspace`.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            env: HashMap::new(),
            shared: SharedResources::new(),
        }
    }

    /// Attach the flow's resolved env variables.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Workspace directory.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Path inside the workspace.
    pub fn workspace_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.workspace.join(relative)
    }

    /// Create the workspace directory (and parents) if missing.
    pub fn ensure_workspace(&self) -> Result<()> {
        fs::create_dir_all(&self.workspace)?;
        debug!("Workspace ready at {}", self.workspace.display());
        Ok(())
    }

    /// Flow env variables.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Store for cross-action hand-off.
    pub fn shared(&self) -> &SharedResources {
        &self.shared
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Filesystem directory the agent may read and write during its own
/// operation. Created at startup if absent; never removed by this crate.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open the workspace rooted at `root`, creating the directory
    /// (and any missing parents) if it does not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create workspace directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

//! Git command facade
//!
//! Named git operations, each one or more invocations of the git executable
//! through [`ProcessRunner`]. The executable is a property of the [`Git`]
//! instance, so independent facades may use different binaries.

mod branch;
mod clone;
mod index;
mod remote;

pub use branch::BranchState;
pub use clone::{normalize_repo_url, redact_url, CloneOptions, CloneOutcome};
pub use index::CommitOutcome;

use std::path::Path;

use crate::process::ProcessRunner;
use crate::Result;

/// Default git executable, resolved through `PATH`
pub const DEFAULT_GIT: &str = "git";

/// Handle for issuing git commands with a fixed executable
#[derive(Debug, Clone)]
pub struct Git {
    /// Name or path of the git executable
    executable: String,
    runner: ProcessRunner,
}

impl Default for Git {
    fn default() -> Self {
        Self::new(DEFAULT_GIT)
    }
}

impl Git {
    /// Create a facade using the given git executable
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            runner: ProcessRunner::new(),
        }
    }

    /// The git executable this facade invokes
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Run an arbitrary git command in `cwd` and return its stdout
    pub async fn run<S: AsRef<str>>(&self, args: &[S], cwd: &Path) -> Result<String> {
        self.runner.run(&self.executable, args, cwd).await
    }

    /// Initialize a repository (`git init`)
    pub async fn init(&self, cwd: &Path) -> Result<()> {
        self.run(&["init"], cwd).await.map(drop)
    }

    /// Remove untracked files and directories (`git clean -f -d`)
    pub async fn clean(&self, cwd: &Path) -> Result<()> {
        self.run(&["clean", "-f", "-d"], cwd).await.map(drop)
    }

    /// Set a config value in the repository (`git config <key> <value>`)
    pub async fn config_set(&self, key: &str, value: &str, cwd: &Path) -> Result<()> {
        self.run(&["config", key, value], cwd).await.map(drop)
    }
}

/// `<remote>/<branch>` treeish
pub fn treeish(remote: &str, branch: &str) -> String {
    format!("{}/{}", remote, branch)
}

//! Staging, committing and tagging

use std::path::Path;

use super::Git;
use crate::Result;

/// Result of a commit-if-changed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was created
    Committed,
    /// The tree matched HEAD, nothing was committed
    Unchanged,
}

impl Git {
    /// Remove tracked files (`git rm --ignore-unmatch -r -f <pathspec...>`)
    pub async fn rm<S: AsRef<str>>(&self, pathspecs: &[S], cwd: &Path) -> Result<()> {
        let mut args = vec!["rm", "--ignore-unmatch", "-r", "-f"];
        args.extend(pathspecs.iter().map(|p| p.as_ref()));
        self.run(&args, cwd).await.map(drop)
    }

    /// Stage files (`git add <pathspec>`)
    pub async fn add(&self, pathspec: &str, cwd: &Path) -> Result<()> {
        self.run(&["add", pathspec], cwd).await.map(drop)
    }

    /// Whether the index differs from HEAD (`git diff-index --quiet HEAD .`)
    ///
    /// Any failure counts as a difference. On a fresh orphan branch HEAD does
    /// not resolve yet, and the first commit must still be made.
    pub async fn has_staged_changes(&self, cwd: &Path) -> bool {
        self.run(&["diff-index", "--quiet", "HEAD", "."], cwd).await.is_err()
    }

    /// Commit staged changes (`git commit -m <message>`)
    pub async fn commit(&self, message: &str, cwd: &Path) -> Result<()> {
        self.run(&["commit", "-m", message], cwd).await.map(drop)
    }

    /// Commit only if the index differs from HEAD
    ///
    /// Git refuses empty commits, and identical republishes should not add
    /// history.
    pub async fn commit_if_changed(&self, message: &str, cwd: &Path) -> Result<CommitOutcome> {
        if !self.has_staged_changes(cwd).await {
            return Ok(CommitOutcome::Unchanged);
        }
        self.commit(message, cwd).await?;
        Ok(CommitOutcome::Committed)
    }

    /// Create a lightweight tag (`git tag <name>`)
    pub async fn tag(&self, name: &str, cwd: &Path) -> Result<()> {
        self.run(&["tag", name], cwd).await.map(drop)
    }
}

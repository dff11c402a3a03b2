//! Branch checkout and synchronization with the remote

use std::path::Path;

use tracing::debug;

use super::{treeish, Git};
use crate::Result;

/// How the publish branch was prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// The branch exists on the remote and the work tree was reset to it
    Synced,
    /// The branch did not exist and was created as an orphan
    Created,
}

impl Git {
    /// Check out an existing branch (`git checkout <branch>`)
    pub async fn checkout_branch(&self, branch: &str, cwd: &Path) -> Result<()> {
        self.run(&["checkout", branch], cwd).await.map(drop)
    }

    /// Create a branch with no history (`git checkout --orphan <branch>`)
    pub async fn checkout_orphan(&self, branch: &str, cwd: &Path) -> Result<()> {
        self.run(&["checkout", "--orphan", branch], cwd).await.map(drop)
    }

    /// Hard reset to `<remote>/<branch>`
    pub async fn reset(&self, remote: &str, branch: &str, cwd: &Path) -> Result<()> {
        let target = treeish(remote, branch);
        self.run(&["reset", "--hard", target.as_str()], cwd).await.map(drop)
    }

    /// Check out `branch`, matching the remote exactly when it exists there
    ///
    /// If `<remote>/<branch>` exists, the local branch is checked out,
    /// untracked files are cleaned and the tree is hard reset to the remote
    /// tip. Otherwise an empty orphan branch is created: files carried over
    /// from the previously checked-out branch are removed from the index and
    /// the work tree.
    pub async fn checkout(&self, remote: &str, branch: &str, cwd: &Path) -> Result<BranchState> {
        if self.remote_branch_exists(remote, branch, cwd).await? {
            debug!(remote, branch, "Remote branch exists, resetting");
            self.checkout_branch(branch, cwd).await?;
            self.clean(cwd).await?;
            self.reset(remote, branch, cwd).await?;
            Ok(BranchState::Synced)
        } else {
            debug!(remote, branch, "Remote branch missing, creating orphan");
            self.checkout_orphan(branch, cwd).await?;
            self.rm(&["."], cwd).await?;
            self.clean(cwd).await?;
            Ok(BranchState::Created)
        }
    }
}

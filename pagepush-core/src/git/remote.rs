//! Remote queries and transfers

use std::path::Path;

use tokio::sync::mpsc;

use super::{treeish, Git};
use crate::{Error, Result};

/// Exit code of `git ls-remote --exit-code` when no ref matched
const LS_REMOTE_NO_MATCH: i32 = 2;

/// Capacity of the stdout progress channel
const PROGRESS_CAPACITY: usize = 16;

impl Git {
    /// Fetch from a remote (`git fetch <remote>`)
    pub async fn fetch(&self, remote: &str, cwd: &Path) -> Result<()> {
        self.run(&["fetch", remote], cwd).await.map(drop)
    }

    /// Push tags and a branch (`git push --tags <remote> <branch>`)
    pub async fn push(&self, remote: &str, branch: &str, cwd: &Path) -> Result<()> {
        self.run(&["push", "--tags", remote, branch], cwd).await.map(drop)
    }

    /// Check whether `<remote>/<branch>` exists in the local repository
    ///
    /// Exit code 2 from `ls-remote --exit-code` means the ref is absent and
    /// yields `Ok(false)`. Any other failure is returned as an error.
    pub async fn remote_branch_exists(&self, remote: &str, branch: &str, cwd: &Path) -> Result<bool> {
        let reference = treeish(remote, branch);
        match self
            .run(&["ls-remote", "--exit-code", ".", reference.as_str()], cwd)
            .await
        {
            Ok(_) => Ok(true),
            Err(Error::Process { code: LS_REMOTE_NO_MATCH, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Read the configured URL of a remote (`git config --get remote.<remote>.url`)
    ///
    /// The value is the first line of output. An unset remote is an error.
    pub async fn remote_url(&self, remote: &str, cwd: &Path) -> Result<String> {
        let key = format!("remote.{}.url", remote);
        let args = ["config", "--get", key.as_str()];
        let (tx, mut rx) = mpsc::channel::<String>(PROGRESS_CAPACITY);

        let first_line = async {
            let mut first = None;
            while let Some(chunk) = rx.recv().await {
                if first.is_none() {
                    first = chunk.lines().next().map(str::to_string);
                }
            }
            first
        };
        let (output, first) = tokio::join!(
            self.runner.run_with_progress(&self.executable, &args, cwd, tx),
            first_line
        );
        output?;

        match first.map(|line| line.trim().to_string()) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(Error::RepoUrl(format!("Remote '{}' has no URL configured", remote))),
        }
    }
}

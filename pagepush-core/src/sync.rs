//! Branch synchronization protocol
//!
//! One publish run moves a single clone through these states:
//!
//! ```text
//! Uncloned -> Cloned -> RemoteVerified -> Cleaned -> Fetched
//!   -> BranchSynced | BranchCreated -> Staged -> Committed
//!   -> [Tagged] -> [Pushed] -> Done
//! ```
//!
//! Each step runs git against the clone and advances the state only on
//! success. Steps refuse to run out of order, so the clean and reset that
//! follow can never happen before the clone's remote has been verified.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::git::{BranchState, CloneOptions, CloneOutcome, CommitOutcome, Git};
use crate::publish::UserIdentity;
use crate::{Error, Result};

/// State of a publish run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No local clone has been confirmed yet
    Uncloned,
    /// The clone directory exists
    Cloned,
    /// The clone's remote URL matches the target repository
    RemoteVerified,
    /// Untracked files were removed
    Cleaned,
    /// The remote was fetched
    Fetched,
    /// The existing remote branch is checked out and reset to its tip
    BranchSynced,
    /// A new orphan branch was created
    BranchCreated,
    /// New content is staged
    Staged,
    /// Staged content is committed (or was identical to HEAD)
    Committed,
    /// The commit was tagged
    Tagged,
    /// The branch was pushed
    Pushed,
    /// The run finished
    Done,
}

impl SyncState {
    /// States reachable from this one
    pub fn valid_transitions(&self) -> &'static [SyncState] {
        use SyncState::*;
        match self {
            Uncloned => &[Cloned],
            Cloned => &[RemoteVerified],
            RemoteVerified => &[Cleaned],
            Cleaned => &[Fetched],
            Fetched => &[BranchSynced, BranchCreated],
            BranchSynced | BranchCreated => &[Staged],
            Staged => &[Committed],
            Committed => &[Tagged, Pushed, Done],
            Tagged => &[Pushed, Done],
            Pushed => &[Done],
            Done => &[],
        }
    }

    /// Check whether moving to `to` is allowed
    pub fn can_transition_to(&self, to: &SyncState) -> bool {
        self.valid_transitions().contains(to)
    }
}

impl From<BranchState> for SyncState {
    fn from(state: BranchState) -> Self {
        match state {
            BranchState::Synced => SyncState::BranchSynced,
            BranchState::Created => SyncState::BranchCreated,
        }
    }
}

/// Outcome of the best-effort tagging step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// The tag was created
    Created(String),
    /// Tagging failed (usually the tag already exists); the run continued
    Failed { tag: String, reason: String },
}

/// Drives one clone through the synchronization protocol
#[derive(Debug)]
pub struct BranchSync<'a> {
    git: &'a Git,
    clone: PathBuf,
    remote: String,
    branch: String,
    state: SyncState,
    history: Vec<SyncState>,
}

impl<'a> BranchSync<'a> {
    /// Start a run for `<remote>/<branch>` in the clone at `clone`
    pub fn new(git: &'a Git, clone: impl Into<PathBuf>, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            git,
            clone: clone.into(),
            remote: remote.into(),
            branch: branch.into(),
            state: SyncState::Uncloned,
            history: vec![SyncState::Uncloned],
        }
    }

    /// Current state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Every state visited so far, in order
    pub fn history(&self) -> &[SyncState] {
        &self.history
    }

    /// The clone directory
    pub fn clone_dir(&self) -> &Path {
        &self.clone
    }

    fn advance(&mut self, to: SyncState) -> Result<()> {
        if !self.state.can_transition_to(&to) {
            return Err(Error::Other(format!(
                "Invalid publish transition from {:?} to {:?}",
                self.state, to
            )));
        }
        debug!(from = ?self.state, to = ?to, clone = %self.clone.display(), "Publish state transition");
        self.state = to;
        self.history.push(to);
        Ok(())
    }

    fn ensure_can_reach(&self, to: SyncState) -> Result<()> {
        if self.state.can_transition_to(&to) {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "Cannot move to {:?} from {:?}",
                to, self.state
            )))
        }
    }

    /// Clone `repo` unless the clone directory already exists
    pub async fn clone_repo(&mut self, repo: &str, depth: Option<u32>, cwd: &Path) -> Result<CloneOutcome> {
        self.ensure_can_reach(SyncState::Cloned)?;
        let options = CloneOptions {
            branch: self.branch.clone(),
            depth,
        };
        let outcome = self.git.clone_into(repo, &self.clone, &options, cwd).await?;
        self.advance(SyncState::Cloned)?;
        Ok(outcome)
    }

    /// Confirm the clone's remote URL equals `expected`
    pub async fn verify_remote(&mut self, expected: &str) -> Result<()> {
        self.ensure_can_reach(SyncState::RemoteVerified)?;
        let found = self.git.remote_url(&self.remote, &self.clone).await?;
        if found != expected {
            return Err(Error::RemoteMismatch {
                found,
                expected: expected.to_string(),
                clone: self.clone.clone(),
            });
        }
        self.advance(SyncState::RemoteVerified)
    }

    /// Remove untracked files left over from earlier runs
    pub async fn clean(&mut self) -> Result<()> {
        self.ensure_can_reach(SyncState::Cleaned)?;
        self.git.clean(&self.clone).await?;
        self.advance(SyncState::Cleaned)
    }

    /// Fetch the remote
    pub async fn fetch(&mut self) -> Result<()> {
        self.ensure_can_reach(SyncState::Fetched)?;
        self.git.fetch(&self.remote, &self.clone).await?;
        self.advance(SyncState::Fetched)
    }

    /// Reset to the remote branch, or create it as an orphan
    pub async fn checkout(&mut self) -> Result<BranchState> {
        self.ensure_can_reach(SyncState::BranchSynced)?;
        let branch_state = self.git.checkout(&self.remote, &self.branch, &self.clone).await?;
        self.advance(branch_state.into())?;
        Ok(branch_state)
    }

    /// Remove tracked files matching `only` so the publish replaces content
    pub async fn remove(&self, only: &[String]) -> Result<()> {
        if !matches!(self.state, SyncState::BranchSynced | SyncState::BranchCreated) {
            return Err(Error::Other(format!("Cannot remove files in state {:?}", self.state)));
        }
        self.git.rm(only, &self.clone).await
    }

    /// Stage everything in the clone
    pub async fn stage(&mut self) -> Result<()> {
        self.ensure_can_reach(SyncState::Staged)?;
        self.git.add(".", &self.clone).await?;
        self.advance(SyncState::Staged)
    }

    /// Write the commit identity into the clone's config
    pub async fn configure_user(&self, user: &UserIdentity) -> Result<()> {
        self.git.config_set("user.email", &user.email, &self.clone).await?;
        self.git.config_set("user.name", &user.name, &self.clone).await
    }

    /// Commit staged changes unless the tree is identical to HEAD
    pub async fn commit(&mut self, message: &str) -> Result<CommitOutcome> {
        self.ensure_can_reach(SyncState::Committed)?;
        let outcome = self.git.commit_if_changed(message, &self.clone).await?;
        self.advance(SyncState::Committed)?;
        Ok(outcome)
    }

    /// Tag the current commit, logging and swallowing any failure
    pub async fn tag(&mut self, tag: &str) -> Result<TagOutcome> {
        self.ensure_can_reach(SyncState::Tagged)?;
        match self.git.tag(tag, &self.clone).await {
            Ok(()) => {
                self.advance(SyncState::Tagged)?;
                Ok(TagOutcome::Created(tag.to_string()))
            }
            Err(err) => {
                let reason = err.to_string().trim().to_string();
                warn!(tag, error = %reason, "Tagging failed, continuing");
                Ok(TagOutcome::Failed {
                    tag: tag.to_string(),
                    reason,
                })
            }
        }
    }

    /// Push tags and the branch
    pub async fn push(&mut self) -> Result<()> {
        self.ensure_can_reach(SyncState::Pushed)?;
        self.git.push(&self.remote, &self.branch, &self.clone).await?;
        self.advance(SyncState::Pushed)
    }

    /// Mark the run complete
    pub fn finish(&mut self) -> Result<()> {
        self.advance(SyncState::Done)
    }
}

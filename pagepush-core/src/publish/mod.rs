//! Publish pipeline
//!
//! Chains the synchronization steps for one target:
//!
//! 1. Resolve the repository URL
//! 2. Clone if the cache has no clone yet
//! 3. Verify the clone's remote, clean, fetch
//! 4. Reset to or create the publish branch
//! 5. Remove old files (unless adding), copy the new ones in, stage
//! 6. Commit if anything changed, tag (best effort), push
//!
//! Stages run strictly in order and the first failure ends the run. Nothing
//! is rolled back: the next run starts again from fetch and reset.

mod options;

pub use options::{default_clone_dir, PublishOptions, UserIdentity};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::files::{needs_nojekyll, select_files, FileCopier, FsCopier};
use crate::git::{normalize_repo_url, redact_url, BranchState, CloneOutcome, CommitOutcome, Git};
use crate::sync::{BranchSync, SyncState, TagOutcome};
use crate::{Error, Result};

/// Remote consulted when no repository URL is configured
const DEFAULT_URL_REMOTE: &str = "origin";

/// Marker file telling GitHub Pages to skip Jekyll
const NOJEKYLL_FILE: &str = ".nojekyll";

/// Summary of a successful publish
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Target name
    pub target: String,
    /// Repository URL, credentials redacted
    pub repo: String,
    /// Clone directory
    pub clone: PathBuf,
    /// Whether a clone was made
    pub clone_outcome: CloneOutcome,
    /// Whether the branch already existed
    pub branch: BranchState,
    /// Whether a commit was made
    pub commit: CommitOutcome,
    /// Tagging result, if a tag was requested
    pub tag: Option<TagOutcome>,
    /// Whether the branch was pushed
    pub pushed: bool,
    /// Number of files copied
    pub files: usize,
    /// States the run passed through
    pub states: Vec<SyncState>,
}

/// Runs the publish pipeline relative to a working directory
#[derive(Debug, Clone)]
pub struct Publisher<C = FsCopier> {
    copier: C,
    cwd: PathBuf,
}

impl Publisher<FsCopier> {
    /// Create a publisher that copies files on the local filesystem
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self::with_copier(FsCopier, cwd)
    }
}

impl<C: FileCopier> Publisher<C> {
    /// Create a publisher with a custom copy implementation
    pub fn with_copier(copier: C, cwd: impl Into<PathBuf>) -> Self {
        Self {
            copier,
            cwd: cwd.into(),
        }
    }

    /// Publish one target
    ///
    /// With `silent` set, any failure is replaced by [`Error::Silenced`] so
    /// that URLs and credentials in git's output are not echoed.
    pub async fn publish(&self, options: &PublishOptions) -> Result<PublishReport> {
        match self.run(options).await {
            Err(err) if options.silent => {
                debug!(target_name = %options.target, error = %err, "Publish failed");
                Err(Error::Silenced)
            }
            result => result,
        }
    }

    async fn run(&self, options: &PublishOptions) -> Result<PublishReport> {
        let log = |message: &str| {
            if !options.silent {
                info!(target_name = %options.target, "{}", message);
            }
        };

        let base = self.cwd.join(&options.base);
        let clone = self.cwd.join(&options.clone);
        let files = self.collect_files(options, &base)?;

        let git = Git::new(options.git.as_str());
        let repo = resolve_repo(&git, options.repo.as_deref(), &self.cwd).await?;
        let safe_repo = redact_url(&repo);

        let mut sync = BranchSync::new(&git, &clone, options.remote.as_str(), options.branch.as_str());

        log(&format!("Cloning {} into {}", safe_repo, clone.display()));
        let clone_outcome = sync.clone_repo(&repo, options.depth, &self.cwd).await?;
        debug!(outcome = ?clone_outcome, "Clone step finished");

        sync.verify_remote(&repo).await?;

        log("Cleaning");
        sync.clean().await?;

        log(&format!("Fetching {}", options.remote));
        sync.fetch().await?;

        log(&format!("Checking out {}/{}", options.remote, options.branch));
        let branch = sync.checkout().await?;

        if !options.add {
            log("Removing files");
            sync.remove(&options.only).await?;
        }

        log("Copying files");
        self.copier.copy(&files, &base, &clone).await?;
        if options.nojekyll && needs_nojekyll(&files) {
            log("Adding .nojekyll");
            tokio::fs::write(clone.join(NOJEKYLL_FILE), "").await?;
        }

        log("Adding all");
        sync.stage().await?;

        if let Some(user) = &options.user {
            sync.configure_user(user).await?;
        }

        log("Committing");
        let commit = sync.commit(&options.message).await?;

        let tag = match &options.tag {
            Some(name) => {
                log("Tagging");
                Some(sync.tag(name).await?)
            }
            None => None,
        };

        if options.push {
            log("Pushing");
            sync.push().await?;
        }
        sync.finish()?;

        Ok(PublishReport {
            target: options.target.clone(),
            repo: safe_repo,
            clone,
            clone_outcome,
            branch,
            commit,
            tag,
            pushed: options.push,
            files: files.len(),
            states: sync.history().to_vec(),
        })
    }

    /// Check preconditions and select the files to publish
    fn collect_files(&self, options: &PublishOptions, base: &Path) -> Result<Vec<PathBuf>> {
        if options.src.is_empty() {
            return Err(Error::Precondition(
                "Required \"src\" property missing.".to_string(),
            ));
        }
        if !base.is_dir() {
            return Err(Error::Precondition(
                "The \"base\" option must be an existing directory".to_string(),
            ));
        }

        let files = select_files(base, &options.src, options.dotfiles)?;
        if files.is_empty() {
            return Err(Error::Precondition(
                "Files must be provided in the \"src\" property.".to_string(),
            ));
        }
        Ok(files)
    }
}

/// Determine the repository to publish to
///
/// An explicit URL wins; otherwise the `origin` URL of the repository in
/// `cwd` is used.
pub async fn resolve_repo(git: &Git, explicit: Option<&str>, cwd: &Path) -> Result<String> {
    if let Some(repo) = explicit {
        return Ok(normalize_repo_url(repo, cwd));
    }

    let url = git.remote_url(DEFAULT_URL_REMOTE, cwd).await.map_err(|err| match err {
        err @ Error::GitNotFound(_) => err,
        _ => Error::RepoUrl(
            "Failed to get remote.origin.url (must either be run in a git repository \
             with a configured origin remote or be configured with the \"repo\" option)."
                .to_string(),
        ),
    })?;
    Ok(normalize_repo_url(&url, cwd))
}

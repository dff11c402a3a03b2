//! Resolved options for a single publish run

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_DIR;
use crate::git::DEFAULT_GIT;

/// Commit author identity written to the clone's git config
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserIdentity {
    /// `user.name`
    pub name: String,
    /// `user.email`
    pub email: String,
}

/// Everything the publish pipeline needs, fully resolved
///
/// Built once per target from config, environment and CLI layers and never
/// mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Target name, used for the default clone directory
    pub target: String,
    /// Glob patterns selecting files under `base`
    pub src: Vec<String>,
    /// Directory the `src` patterns are relative to
    pub base: PathBuf,
    /// Local clone used as a cache between runs
    pub clone: PathBuf,
    /// Match dotfiles with wildcards
    pub dotfiles: bool,
    /// Branch to publish to
    pub branch: String,
    /// Remote alias
    pub remote: String,
    /// Repository URL; read from the current repository if unset
    pub repo: Option<String>,
    /// Pathspecs removed before copying in replace mode
    pub only: Vec<String>,
    /// Add files without removing existing ones
    pub add: bool,
    /// Push after committing
    pub push: bool,
    /// Commit message
    pub message: String,
    /// Suppress progress logging and error detail
    pub silent: bool,
    /// Commit author identity
    pub user: Option<UserIdentity>,
    /// Tag to create on the new commit
    pub tag: Option<String>,
    /// Git executable
    pub git: String,
    /// Shallow clone depth
    pub depth: Option<u32>,
    /// Write a `.nojekyll` marker when a path segment starts with `_`
    pub nojekyll: bool,
}

impl PublishOptions {
    /// Options with default values for a target, publishing `src` from `base`
    pub fn new(target: impl Into<String>, src: Vec<String>, base: impl Into<PathBuf>) -> Self {
        let target = target.into();
        Self {
            clone: default_clone_dir(&target),
            target,
            src,
            base: base.into(),
            dotfiles: false,
            branch: "gh-pages".to_string(),
            remote: "origin".to_string(),
            repo: None,
            only: vec![".".to_string()],
            add: false,
            push: true,
            message: "Updates".to_string(),
            silent: false,
            user: None,
            tag: None,
            git: DEFAULT_GIT.to_string(),
            depth: None,
            nojekyll: false,
        }
    }
}

/// Default clone directory for a target, relative to the working directory
pub fn default_clone_dir(target: &str) -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR).join(target)
}

//! pagepush core - publish a directory of static files to a git branch
//!
//! This crate drives the `git` executable to keep a cached clone in sync
//! with a publish branch (typically `gh-pages`), replace its content with a
//! selected set of files, and commit, tag and push the result.

pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod git;
pub mod process;
pub mod publish;
pub mod sync;

pub use cache::{clean_cache, DEFAULT_CACHE_DIR};
pub use config::{Config, Patterns, TargetConfig, Targets};
pub use error::{Error, Result};
pub use files::{FileCopier, FsCopier};
pub use git::{BranchState, CloneOutcome, CommitOutcome, Git};
pub use process::ProcessRunner;
pub use publish::{resolve_repo, PublishOptions, PublishReport, Publisher, UserIdentity};
pub use sync::{BranchSync, SyncState, TagOutcome};

//! Publish command - push static files to the publish branch

use std::path::{Path, PathBuf};

use clap::Args;
use pagepush_core::{
    CommitOutcome, Config, Patterns, PublishReport, Publisher, TagOutcome, TargetConfig,
    UserIdentity,
};

/// Target name used when no targets are configured or named
const AD_HOC_TARGET: &str = "default";

/// Arguments for the publish command
#[derive(Args, Debug, Default)]
pub struct PublishArgs {
    /// Targets from the config file to publish (all targets if omitted)
    pub targets: Vec<String>,

    /// Glob pattern selecting files to publish (repeatable, `!` to exclude)
    #[arg(short, long = "src")]
    pub src: Vec<String>,

    /// Directory the src patterns are relative to
    #[arg(short, long)]
    pub base: Option<PathBuf>,

    /// Directory for the cached clone
    #[arg(long)]
    pub clone: Option<PathBuf>,

    /// Include files whose names start with a dot
    #[arg(long)]
    pub dotfiles: bool,

    /// Branch to publish to
    #[arg(long)]
    pub branch: Option<String>,

    /// Remote alias
    #[arg(long)]
    pub remote: Option<String>,

    /// Repository URL (defaults to the origin of the current repository)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Pathspec removed before copying (repeatable)
    #[arg(long)]
    pub only: Vec<String>,

    /// Add files without removing existing ones
    #[arg(long)]
    pub add: bool,

    /// Commit locally without pushing
    #[arg(long)]
    pub no_push: bool,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Suppress progress output and error detail
    #[arg(long)]
    pub silent: bool,

    /// Commit author name (requires --user-email)
    #[arg(long, requires = "user_email")]
    pub user_name: Option<String>,

    /// Commit author email (requires --user-name)
    #[arg(long, requires = "user_name")]
    pub user_email: Option<String>,

    /// Tag to create on the published commit
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Shallow clone depth
    #[arg(long)]
    pub depth: Option<u32>,

    /// Add a .nojekyll file when a published path starts with an underscore
    #[arg(long)]
    pub nojekyll: bool,
}

impl PublishArgs {
    /// Options given on the command line, as the top override layer
    pub fn overrides(&self, git: Option<String>) -> TargetConfig {
        let user = match (&self.user_name, &self.user_email) {
            (Some(name), Some(email)) => Some(UserIdentity {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        };

        TargetConfig {
            src: (!self.src.is_empty()).then(|| Patterns::Many(self.src.clone())),
            base: self.base.clone(),
            clone: self.clone.clone(),
            dotfiles: self.dotfiles.then_some(true),
            branch: self.branch.clone(),
            remote: self.remote.clone(),
            repo: self.repo.clone(),
            only: (!self.only.is_empty()).then(|| Patterns::Many(self.only.clone())),
            add: self.add.then_some(true),
            push: self.no_push.then_some(false),
            message: self.message.clone(),
            silent: self.silent.then_some(true),
            user,
            tag: self.tag.clone(),
            git,
            depth: self.depth,
            nojekyll: self.nojekyll.then_some(true),
        }
    }

    /// Targets to publish, in order
    fn target_names(&self, config: &Config) -> Vec<String> {
        if !self.targets.is_empty() {
            return self.targets.clone();
        }
        let configured = config.target_names();
        if configured.is_empty() {
            vec![AD_HOC_TARGET.to_string()]
        } else {
            configured
        }
    }

    /// Execute the publish command
    ///
    /// Targets run one after another; the first failure stops the run.
    pub async fn execute(&self, config: &Config, git: Option<String>, cwd: &Path) -> anyhow::Result<()> {
        let overrides = self.overrides(git);
        let publisher = Publisher::new(cwd);

        for target in self.target_names(config) {
            let options = config.resolve(&target, &overrides, cwd)?;
            tracing::debug!(target_name = %target, options = ?options, "Resolved publish options");

            let report = publisher.publish(&options).await?;
            if !options.silent {
                print_report(&report);
            }
        }

        Ok(())
    }
}

fn print_report(report: &PublishReport) {
    println!("Published {} ({} files)", report.target, report.files);
    println!("  Repository: {}", report.repo);
    println!("  Clone:      {}", report.clone.display());

    match report.commit {
        CommitOutcome::Committed => println!("  Commit:     created"),
        CommitOutcome::Unchanged => println!("  Commit:     unchanged, nothing to commit"),
    }

    match &report.tag {
        Some(TagOutcome::Created(tag)) => println!("  Tag:        {}", tag),
        Some(TagOutcome::Failed { tag, .. }) => println!("  Tag:        {} (failed, skipped)", tag),
        None => {}
    }

    if report.pushed {
        println!("  Pushed:     yes");
    } else {
        println!("  Pushed:     no (push disabled)");
    }
}

//! Shared fixtures for publish integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pagepush_core::{PublishOptions, UserIdentity};
use tempfile::TempDir;

pub const USER_NAME: &str = "My Name";
pub const USER_EMAIL: &str = "mail@example.com";

/// Run git synchronously, panicking on failure
pub fn git(args: &[&str], cwd: &Path) -> String {
    let output = Command::new("git")
        .args(["-c", &format!("user.name={}", USER_NAME)])
        .args(["-c", &format!("user.email={}", USER_EMAIL)])
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A scratch project with a bare remote
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Bare remote with no commits
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        git2::Repository::init_bare(dir.path().join("remote.git")).unwrap();
        Self { dir }
    }

    /// Bare remote whose default branch has one commit with `README.md`
    pub fn seeded() -> Self {
        let fixture = Self::empty();
        let seed = fixture.root().join("seed");
        fs::create_dir_all(&seed).unwrap();
        fs::write(seed.join("README.md"), "# project\n").unwrap();
        git(&["init"], &seed);
        git(&["add", "."], &seed);
        git(&["commit", "-m", "Initial commit"], &seed);
        git(&["remote", "add", "origin", &fixture.remote_url()], &seed);
        git(&["push", "origin", "HEAD"], &seed);
        // Point the remote HEAD at the pushed branch whatever init's default is
        let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"], &seed);
        let head = format!("refs/heads/{}", branch.trim());
        git(&["symbolic-ref", "HEAD", &head], &fixture.remote_path());
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn remote_path(&self) -> PathBuf {
        self.root().join("remote.git")
    }

    pub fn remote_url(&self) -> String {
        self.remote_path().to_string_lossy().into_owned()
    }

    /// Write a file under the project root, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Options publishing `src` from `base` to this fixture's remote
    pub fn options(&self, target: &str, base: &str, src: &[&str]) -> PublishOptions {
        let mut options = PublishOptions::new(
            target,
            src.iter().map(|s| s.to_string()).collect(),
            self.root().join(base),
        );
        options.repo = Some(self.remote_url());
        options.user = Some(UserIdentity {
            name: USER_NAME.to_string(),
            email: USER_EMAIL.to_string(),
        });
        options
    }

    /// Default clone directory of a target
    pub fn clone_dir(&self, target: &str) -> PathBuf {
        self.root().join(".pagepush").join(target)
    }

    pub fn remote_repo(&self) -> git2::Repository {
        git2::Repository::open_bare(self.remote_path()).unwrap()
    }

    /// Number of commits on `branch` in the remote, 0 if it does not exist
    pub fn remote_commit_count(&self, branch: &str) -> usize {
        let repo = self.remote_repo();
        let Ok(reference) = repo.find_reference(&format!("refs/heads/{}", branch)) else {
            return 0;
        };
        let mut walk = repo.revwalk().unwrap();
        walk.push(reference.target().unwrap()).unwrap();
        walk.count()
    }

    /// Paths of the files in the tip tree of `branch` on the remote
    pub fn remote_files(&self, branch: &str) -> Vec<String> {
        let repo = self.remote_repo();
        let tree = repo
            .find_reference(&format!("refs/heads/{}", branch))
            .unwrap()
            .peel_to_tree()
            .unwrap();
        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(git2::ObjectType::Blob) {
                files.push(format!("{}{}", dir, entry.name().unwrap()));
            }
            git2::TreeWalkResult::Ok
        })
        .unwrap();
        files.sort();
        files
    }
}

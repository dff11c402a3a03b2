//! Source file selection and copying into the clone

use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use glob::{MatchOptions, Pattern};

use crate::{Error, Result};

/// Prefix marking an exclusion pattern
const NEGATION: char = '!';

/// Copies a selected file set from a base directory into a destination
#[async_trait]
pub trait FileCopier: Send + Sync {
    /// Copy `files` (relative to `base`) into `dest`, keeping relative paths
    async fn copy(&self, files: &[PathBuf], base: &Path, dest: &Path) -> Result<()>;
}

/// Copier backed by the local filesystem
///
/// Creates directories parents-first, then copies files concurrently.
/// Existing destination files are overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

#[async_trait]
impl FileCopier for FsCopier {
    async fn copy(&self, files: &[PathBuf], base: &Path, dest: &Path) -> Result<()> {
        for dir in dirs_to_create(files) {
            tokio::fs::create_dir_all(dest.join(dir)).await?;
        }

        try_join_all(files.iter().map(|file| {
            let from = base.join(file);
            let to = dest.join(file);
            async move {
                tokio::fs::copy(&from, &to).await.map_err(|e| {
                    Error::Other(format!(
                        "Failed to copy {} to {}: {}",
                        from.display(),
                        to.display(),
                        e
                    ))
                })
            }
        }))
        .await?;

        Ok(())
    }
}

fn match_options(dotfiles: bool) -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: !dotfiles,
    }
}

/// Expand glob `patterns` relative to `base` into a sorted list of files
///
/// Only regular files are returned, as paths relative to `base`. Patterns
/// starting with `!` remove matches of earlier patterns. Names starting with
/// a dot are only matched by wildcards when `dotfiles` is set.
pub fn select_files<S: AsRef<str>>(base: &Path, patterns: &[S], dotfiles: bool) -> Result<Vec<PathBuf>> {
    let options = match_options(dotfiles);
    let escaped_base = Pattern::escape(&base.to_string_lossy());
    let mut selected = BTreeSet::new();

    for pattern in patterns.iter().map(AsRef::as_ref) {
        if let Some(excluded) = pattern.strip_prefix(NEGATION) {
            let excluded = Pattern::new(excluded)?;
            selected.retain(|file: &PathBuf| !excluded.matches_path_with(file, options));
            continue;
        }

        let full = format!("{}/{}", escaped_base.trim_end_matches('/'), pattern);
        let entries = glob::glob_with(&full, options)?;
        for entry in entries {
            let path = entry.map_err(|e| Error::Io(e.into()))?;
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(base) {
                selected.insert(normalize(relative));
            }
        }
    }

    Ok(selected.into_iter().collect())
}

/// Drop `.` components so the same file is never listed twice
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Directories to create, parents first, for a list of relative file paths
///
/// Shorter paths come first; paths of equal depth are ordered by segment.
pub fn dirs_to_create(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: HashSet<PathBuf> = HashSet::new();
    for file in files {
        let mut parent = file.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.insert(dir.to_path_buf());
            parent = dir.parent();
        }
    }

    let mut dirs: Vec<PathBuf> = dirs.into_iter().collect();
    dirs.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    dirs
}

/// Whether GitHub Pages would need a `.nojekyll` marker for these files
///
/// Jekyll skips any path segment starting with an underscore.
pub fn needs_nojekyll(files: &[PathBuf]) -> bool {
    files.iter().any(|file| {
        file.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('_'),
            _ => false,
        })
    })
}

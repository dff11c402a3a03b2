//! Clone cache management
//!
//! Each target keeps its clone under the cache directory so later runs only
//! fetch. Removing the cache forces fresh clones.

use std::path::Path;

use tracing::info;

use crate::Result;

/// Cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = ".pagepush";

/// Remove the cache directory and every clone in it
///
/// Returns `false` if there was nothing to remove.
pub async fn clean_cache(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }

    info!(dir = %dir.display(), "Removing clone cache");
    tokio::fs::remove_dir_all(dir).await?;
    Ok(true)
}

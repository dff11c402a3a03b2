//! Clean command - remove cached clones

use std::path::{Path, PathBuf};

use clap::Args;
use pagepush_core::{clean_cache, DEFAULT_CACHE_DIR};

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Cache directory to remove
    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    pub dir: PathBuf,
}

impl CleanArgs {
    /// Execute the clean command
    pub async fn execute(&self, cwd: &Path) -> anyhow::Result<()> {
        let dir = cwd.join(&self.dir);
        if clean_cache(&dir).await? {
            println!("Removed {}", dir.display());
        } else {
            println!("Nothing to clean at {}", dir.display());
        }
        Ok(())
    }
}

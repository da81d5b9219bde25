//! Local path policy.
//!
//! Relative paths land under the home directory, not the working
//! directory: MCP hosts often start servers from an unpredictable or
//! read-only cwd.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PathResolver {
    home: PathBuf,
}

impl PathResolver {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().context("Unable to determine the home directory")?;
        Ok(Self::new(home))
    }

    /// Pure: absolute stays, `~` / `~/x` expand, anything else joins home.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return candidate.to_path_buf();
        }
        if path == "~" {
            return self.home.clone();
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return self.home.join(rest);
        }
        self.home.join(candidate)
    }
}

/// Create `dir` if needed and prove it accepts a new file.
///
/// Never errors: any failure reads as `false` and callers decide.
pub async fn ensure_writable(dir: &Path) -> bool {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        debug!(dir = %dir.display(), error = %e, "create_dir_all failed");
        return false;
    }
    let probe = dir.join(format!(".write-test-{}", crate::utils::unique_suffix()));
    match tokio::fs::write(&probe, b"test").await {
        Ok(()) => tokio::fs::remove_file(&probe).await.is_ok(),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "probe write failed");
            false
        }
    }
}

/// Parent directory of a resolved file path (root when there is none).
pub fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

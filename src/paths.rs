//! Filesystem locations used by the manager
//!
//! Everything lives under a single application-private data root:
//! the settings file, the modules root and its reserved disabled directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::paths::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data_root: PathBuf,
}

impl AppPaths {
    /// Use an explicit data root (CLI flag, tests)
    pub fn with_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Resolve the data root: explicit override > MODSWITCH_DATA_DIR > platform data dir
    pub fn resolve(override_root: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = override_root {
            debug!(root = %root.display(), "Using data root from command line");
            return Ok(Self::with_root(root));
        }

        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            let root = PathBuf::from(root);
            debug!(root = %root.display(), var = DATA_DIR_ENV, "Using data root from environment");
            return Ok(Self::with_root(root));
        }

        let mut root = dirs::data_dir()
            .context("Failed to determine data directory (set MODSWITCH_DATA_DIR or pass --data-dir)")?;
        root.push(APP_DIR);
        Ok(Self::with_root(root))
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_root.join(SETTINGS_FILENAME)
    }

    pub fn modules_root(&self) -> PathBuf {
        self.data_root.join(MODULES_DIR)
    }

    pub fn disabled_dir(&self) -> PathBuf {
        self.modules_root().join(DISABLED_DIR)
    }
}

//! Module discovery
//!
//! Builds the set of known module identifiers from the built-in list plus
//! whatever directories currently sit under the modules root, enabled or not.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::paths::DISABLED_DIR;

/// Modules every installation knows about, whether or not they are on disk
pub const DEFAULT_MODULES: [&str; 3] = ["2.vive focus vision", "1.htc facial", "3.bigscreen eye"];

#[derive(Debug, Clone)]
pub struct ModuleScanner {
    modules_root: PathBuf,
}

impl ModuleScanner {
    pub fn new(modules_root: impl Into<PathBuf>) -> Self {
        Self {
            modules_root: modules_root.into(),
        }
    }

    pub fn modules_root(&self) -> &Path {
        &self.modules_root
    }

    /// Recompute the known modules from scratch.
    /// Read-only; a missing modules root yields just the built-in list.
    pub fn refresh(&self) -> Vec<String> {
        let mut known: Vec<String> = DEFAULT_MODULES.iter().map(|m| m.to_string()).collect();

        let enabled = subdirectory_names(&self.modules_root);
        let disabled = subdirectory_names(&self.modules_root.join(DISABLED_DIR));

        // the reserved name can never be moved, at either level
        for name in enabled.into_iter().chain(disabled).filter(|name| name != DISABLED_DIR) {
            if !known.contains(&name) {
                known.push(name);
            }
        }

        debug!(root = %self.modules_root.display(), count = known.len(), "Refreshed known modules");
        known
    }
}

/// Names of the directories directly under `dir`.
/// Missing directories, files, empty and non-UTF-8 names are skipped.
fn subdirectory_names(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if dir.exists() {
                warn!(path = %dir.display(), error = %e, "Failed to list module directory");
            }
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.path().is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if !name.is_empty() => names.push(name),
            Ok(_) => {}
            Err(raw) => warn!(name = ?raw, "Skipping module directory with non UTF-8 name"),
        }
    }

    // read_dir order is platform dependent
    names.sort();
    names
}

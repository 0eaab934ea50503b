//! Module activation
//!
//! A module is enabled when its directory sits directly under the modules
//! root, and disabled when it sits under the reserved `.disable` directory.
//! Reconciliation moves directories between the two so that on-disk state
//! matches a configuration's module list.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};

use crate::constants::paths::DISABLED_DIR;

/// Outcome of a single-module move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleMove {
    Enabled,
    Disabled,
    /// Already in the requested state, or not installed at all
    Unchanged,
}

/// Per-module results of a reconciliation pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    pub failures: Vec<(String, anyhow::Error)>,
}

impl ReconcileReport {
    /// Number of directories actually moved
    pub fn moves(&self) -> usize {
        self.enabled.len() + self.disabled.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    modules_root: PathBuf,
}

impl Reconciler {
    pub fn new(modules_root: impl Into<PathBuf>) -> Self {
        Self {
            modules_root: modules_root.into(),
        }
    }

    pub fn enabled_path(&self, name: &str) -> PathBuf {
        self.modules_root.join(name)
    }

    pub fn disabled_path(&self, name: &str) -> PathBuf {
        self.disabled_dir().join(name)
    }

    fn disabled_dir(&self) -> PathBuf {
        self.modules_root.join(DISABLED_DIR)
    }

    /// Move every known module into the state `desired` asks for.
    /// A failing module is logged and recorded; the rest are still processed.
    pub fn reconcile(&self, desired: &[String], known: &[String]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for name in known {
            let enable = desired.contains(name);
            match self.set_module_enabled(name, enable) {
                Ok(ModuleMove::Enabled) => report.enabled.push(name.clone()),
                Ok(ModuleMove::Disabled) => report.disabled.push(name.clone()),
                Ok(ModuleMove::Unchanged) => {}
                Err(e) => {
                    error!(module = %name, enable, error = ?e, "Failed to move module");
                    report.failures.push((name.clone(), e));
                }
            }
        }

        info!(
            enabled = report.enabled.len(),
            disabled = report.disabled.len(),
            failed = report.failures.len(),
            "Reconciled modules"
        );
        report
    }

    pub fn set_module_enabled(&self, name: &str, enable: bool) -> Result<ModuleMove> {
        let mut components = Path::new(name).components();
        let single_component = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_component || name == DISABLED_DIR {
            bail!("Invalid module name '{name}'");
        }

        let disabled_dir = self.disabled_dir();
        fs::create_dir_all(&disabled_dir)
            .with_context(|| format!("Failed to create disabled directory {}", disabled_dir.display()))?;

        let enabled_path = self.enabled_path(name);
        let disabled_path = self.disabled_path(name);

        let (from, to, outcome) = if enable {
            (disabled_path, enabled_path, ModuleMove::Enabled)
        } else {
            (enabled_path, disabled_path, ModuleMove::Disabled)
        };

        if !from.is_dir() {
            debug!(module = %name, enable, "Module already in requested state");
            return Ok(ModuleMove::Unchanged);
        }

        if to.exists() {
            bail!(
                "Cannot move {} to {}: destination already exists",
                from.display(),
                to.display()
            );
        }

        fs::rename(&from, &to)
            .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))?;
        info!(module = %name, enable, "Moved module");
        Ok(outcome)
    }
}

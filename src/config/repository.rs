//! Configuration repository
//!
//! Owns the configuration collection and the single active-configuration
//! pointer, keeps the `is_active` flags in step with that pointer, and drives
//! reconciliation so the modules on disk follow the active configuration.
//!
//! Nothing here persists implicitly: callers run `save()` after edits.
//! `set_active()` is the exception, it always saves once it has reconciled.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Configuration;
use crate::constants::configuration::{PRIMARY_DEFAULT_NAME, SECONDARY_DEFAULT_NAME};
use crate::constants::settings::{ACTIVE_CONFIGURATION_KEY, CONFIGURATIONS_KEY};
use crate::import;
use crate::paths::AppPaths;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::scanner::{ModuleScanner, DEFAULT_MODULES};
use crate::settings::SettingsStore;

/// Result of an activation request
#[derive(Debug)]
pub enum Activation {
    Activated(ReconcileReport),
    /// No configuration matched; nothing was changed
    NotFound,
}

impl Activation {
    pub fn is_activated(&self) -> bool {
        matches!(self, Activation::Activated(_))
    }
}

#[derive(Debug)]
pub struct ConfigurationRepository<S> {
    store: S,
    scanner: ModuleScanner,
    reconciler: Reconciler,
    configurations: Vec<Configuration>,
    active_id: Option<Uuid>,
    known_modules: Vec<String>,
}

impl<S: SettingsStore> ConfigurationRepository<S> {
    /// Empty repository; call `initialize()` before use
    pub fn new(store: S, modules_root: &Path) -> Self {
        Self {
            store,
            scanner: ModuleScanner::new(modules_root),
            reconciler: Reconciler::new(modules_root),
            configurations: Vec::new(),
            active_id: None,
            known_modules: Vec::new(),
        }
    }

    pub fn with_paths(store: S, paths: &AppPaths) -> Self {
        Self::new(store, &paths.modules_root())
    }

    /// Discover modules, load or bootstrap configurations, then re-assert the
    /// active configuration on disk.
    pub fn initialize(&mut self) -> Result<Option<Activation>> {
        self.refresh_known_modules();

        let stored: Option<Vec<Configuration>> = self
            .store
            .read_setting(CONFIGURATIONS_KEY)
            .context("Failed to load configurations")?;

        let persisted_active = match stored {
            Some(mut configurations) => {
                configurations.iter_mut().for_each(Configuration::dedup_modules);
                info!(count = configurations.len(), "Loaded configurations");
                self.configurations = configurations;
                self.store
                    .read_setting::<Uuid>(ACTIVE_CONFIGURATION_KEY)
                    .context("Failed to load active configuration id")?
            }
            None => {
                info!("No stored configurations, creating defaults");
                self.create_default_configurations()?
            }
        };

        let resolved = persisted_active
            .filter(|id| {
                let exists = self.configuration(*id).is_some();
                if !exists {
                    warn!(id = %id, "Persisted active configuration no longer exists");
                }
                exists
            })
            .or_else(|| self.configurations.first().map(Configuration::id));
        self.active_id = resolved;
        self.sync_active_flags();

        match self.active_id {
            Some(id) => self.set_active(id).map(Some),
            None => {
                info!("No configurations, nothing to activate");
                Ok(None)
            }
        }
    }

    /// First-run collection: the first built-in module on its own (active),
    /// and the remaining built-in modules together.
    fn create_default_configurations(&mut self) -> Result<Option<Uuid>> {
        let (first, rest) = DEFAULT_MODULES.split_at(1);

        let mut primary = Configuration::with_modules(PRIMARY_DEFAULT_NAME, first.iter().copied());
        primary.set_active_flag(true);
        let secondary = Configuration::with_modules(SECONDARY_DEFAULT_NAME, rest.iter().copied());

        let active = primary.id();
        self.configurations = vec![primary, secondary];
        self.active_id = Some(active);
        self.save().context("Failed to persist default configurations")?;
        Ok(Some(active))
    }

    /// Make `id` the active configuration, reconcile the modules on disk and save.
    /// Unknown ids change nothing and report `NotFound`.
    pub fn set_active(&mut self, id: Uuid) -> Result<Activation> {
        let Some(target) = self.configuration(id) else {
            warn!(id = %id, "Activation requested for unknown configuration");
            return Ok(Activation::NotFound);
        };
        let desired = target.modules().to_vec();
        info!(configuration = %target.name, id = %id, "Activating configuration");

        // Flags are settled before touching the filesystem
        self.active_id = Some(id);
        self.sync_active_flags();

        let report = self.reconciler.reconcile(&desired, &self.known_modules);
        if !report.is_clean() {
            warn!(failed = report.failures.len(), "Some modules could not be moved");
        }

        self.save()?;
        Ok(Activation::Activated(report))
    }

    /// Legacy lookup by display name; the first match wins
    pub fn set_active_by_name(&mut self, name: &str) -> Result<Activation> {
        match self.configurations.iter().find(|c| c.name == name) {
            Some(configuration) => {
                let id = configuration.id();
                self.set_active(id)
            }
            None => {
                warn!(configuration = %name, "Activation requested for unknown configuration name");
                Ok(Activation::NotFound)
            }
        }
    }

    /// Rescan the modules directory. Does not reconcile.
    pub fn refresh_known_modules(&mut self) {
        self.known_modules = self.scanner.refresh();
    }

    pub fn save(&mut self) -> Result<()> {
        self.store
            .save_setting(CONFIGURATIONS_KEY, &self.configurations)
            .context("Failed to save configurations")?;
        self.store
            .save_setting(ACTIVE_CONFIGURATION_KEY, &self.active_id)
            .context("Failed to save active configuration id")?;
        info!(count = self.configurations.len(), active = ?self.active_id, "Saved configurations");
        Ok(())
    }

    fn sync_active_flags(&mut self) {
        let active = self.active_id;
        for configuration in &mut self.configurations {
            configuration.set_active_flag(Some(configuration.id()) == active);
        }
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn configuration(&self, id: Uuid) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.id() == id)
    }

    fn configuration_mut(&mut self, id: Uuid) -> Option<&mut Configuration> {
        self.configurations.iter_mut().find(|c| c.id() == id)
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active_id
    }

    pub fn active_configuration(&self) -> Option<&Configuration> {
        self.active_id.and_then(|id| self.configuration(id))
    }

    pub fn known_modules(&self) -> &[String] {
        &self.known_modules
    }

    /// Known modules the configuration does not include yet
    pub fn available_modules(&self, id: Uuid) -> Option<Vec<String>> {
        let configuration = self.configuration(id)?;
        Some(
            self.known_modules
                .iter()
                .filter(|m| !configuration.includes(m))
                .cloned()
                .collect(),
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add_configuration(&mut self, name: impl Into<String>) -> Uuid {
        let configuration = Configuration::new(name);
        let id = configuration.id();
        info!(configuration = %configuration.name, id = %id, "Added configuration");
        self.configurations.push(configuration);
        id
    }

    pub fn duplicate_configuration(&mut self, id: Uuid, name: impl Into<String>) -> Option<Uuid> {
        let copy = self.configuration(id)?.duplicate(name);
        let copy_id = copy.id();
        info!(source = %id, configuration = %copy.name, id = %copy_id, "Duplicated configuration");
        self.configurations.push(copy);
        Some(copy_id)
    }

    /// Removing the active configuration leaves no configuration active.
    /// Modules on disk are left as they are.
    pub fn remove_configuration(&mut self, id: Uuid) -> Option<Configuration> {
        let index = self.configurations.iter().position(|c| c.id() == id)?;
        let mut removed = self.configurations.remove(index);

        if self.active_id == Some(id) {
            info!(configuration = %removed.name, "Removed the active configuration");
            self.active_id = None;
        }
        removed.set_active_flag(false);
        self.sync_active_flags();
        info!(configuration = %removed.name, id = %id, "Removed configuration");
        Some(removed)
    }

    pub fn rename_configuration(&mut self, id: Uuid, name: impl Into<String>) -> bool {
        match self.configuration_mut(id) {
            Some(configuration) => {
                configuration.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_configuration_modules<I, M>(&mut self, id: Uuid, modules: I) -> bool
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        match self.configuration_mut(id) {
            Some(configuration) => {
                configuration.set_modules(modules);
                true
            }
            None => false,
        }
    }

    /// Returns false if the configuration is unknown or already includes the module
    pub fn add_module_to_configuration(&mut self, id: Uuid, module: &str) -> bool {
        self.configuration_mut(id)
            .is_some_and(|configuration| configuration.add_module(module))
    }

    pub fn remove_module_from_configuration(&mut self, id: Uuid, module: &str) -> bool {
        self.configuration_mut(id)
            .is_some_and(|configuration| configuration.remove_module(module))
    }

    /// Copy a module folder into the modules root, pick it up and save.
    pub fn import_module(&mut self, source: &Path) -> Result<String> {
        let name = import::import_module(source, self.scanner.modules_root(), &self.known_modules)?;
        self.refresh_known_modules();
        self.save()?;
        Ok(name)
    }
}

//! Configuration entity
//!
//! A named set of modules that should be enabled together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::configuration::DEFAULT_NAME;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    id: Uuid,
    pub name: String,
    #[serde(default)]
    active_module_names: Vec<String>,
    /// Mirrors the repository's active id; only the repository writes it
    #[serde(default)]
    is_active: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Configuration {
    /// Create an inactive configuration with a fresh id and no modules
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            active_module_names: Vec::new(),
            is_active: false,
        }
    }

    pub fn with_modules<I, S>(name: impl Into<String>, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut configuration = Self::new(name);
        configuration.set_modules(modules);
        configuration
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub(crate) fn set_active_flag(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Modules in insertion order
    pub fn modules(&self) -> &[String] {
        &self.active_module_names
    }

    pub fn includes(&self, module: &str) -> bool {
        self.active_module_names.iter().any(|m| m == module)
    }

    /// Append a module; returns false if it was already included
    pub fn add_module(&mut self, module: impl Into<String>) -> bool {
        let module = module.into();
        if self.includes(&module) {
            return false;
        }
        self.active_module_names.push(module);
        true
    }

    /// Returns false if the module was not included
    pub fn remove_module(&mut self, module: &str) -> bool {
        let before = self.active_module_names.len();
        self.active_module_names.retain(|m| m != module);
        self.active_module_names.len() != before
    }

    /// Replace the module list, dropping duplicates but keeping first-seen order
    pub fn set_modules<I, S>(&mut self, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_module_names.clear();
        for module in modules {
            self.add_module(module);
        }
    }

    /// Copy this configuration's modules under a new id and name (inactive)
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        let mut copy = Self::new(name);
        copy.active_module_names = self.active_module_names.clone();
        copy
    }

    /// Persisted lists may carry duplicates written by older versions
    pub(crate) fn dedup_modules(&mut self) {
        let modules = std::mem::take(&mut self.active_module_names);
        self.set_modules(modules);
    }
}

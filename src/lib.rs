//! Configuration & module-activation manager
//!
//! Keeps a set of named configurations, each listing the tracking modules it
//! wants enabled, and moves module folders between the modules root and its
//! `.disable` directory so the filesystem matches the active configuration.

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod import;
pub mod paths;
pub mod reconcile;
pub mod scanner;
pub mod settings;

pub use config::{Activation, Configuration, ConfigurationRepository};
pub use paths::AppPaths;
pub use reconcile::{ModuleMove, ReconcileReport, Reconciler};
pub use scanner::{ModuleScanner, DEFAULT_MODULES};
pub use settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore};

//! Application-wide constants
//!
//! This module contains all magic strings used throughout the application,
//! providing a single source of truth for directory names and settings keys.

/// Filesystem layout constants
pub mod paths {
    /// Application directory under the platform data dir
    pub const APP_DIR: &str = "modswitch";

    /// Modules root, relative to the data root
    pub const MODULES_DIR: &str = "CustomLibs";

    /// Reserved subdirectory of the modules root holding disabled modules
    pub const DISABLED_DIR: &str = ".disable";

    /// Settings file, relative to the data root
    pub const SETTINGS_FILENAME: &str = "settings.json";

    /// Environment variable overriding the data root
    pub const DATA_DIR_ENV: &str = "MODSWITCH_DATA_DIR";
}

/// Settings store keys
pub mod settings {
    /// Serialized configuration collection
    pub const CONFIGURATIONS_KEY: &str = "CustomConfigurations";

    /// Identifier of the active configuration (nullable)
    pub const ACTIVE_CONFIGURATION_KEY: &str = "ActiveConfigurationId";
}

/// Configuration defaults
pub mod configuration {
    /// Name given to configurations created without one
    pub const DEFAULT_NAME: &str = "New Configuration";

    /// Name of the bootstrap configuration that selects the first built-in module
    pub const PRIMARY_DEFAULT_NAME: &str = "Vive Focus Vision";

    /// Name of the bootstrap configuration that selects the remaining built-in modules
    pub const SECONDARY_DEFAULT_NAME: &str = "Bigscreen Beyond";
}

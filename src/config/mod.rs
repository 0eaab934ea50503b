//! Configuration management
//!
//! - **configuration**: the entity, a named set of modules
//! - **repository**: the collection, the active pointer and activation

pub mod configuration;
pub mod repository;

// Re-export commonly used types
pub use configuration::Configuration;
pub use repository::{Activation, ConfigurationRepository};

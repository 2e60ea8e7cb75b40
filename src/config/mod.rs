//! Configuration management for einkd

pub mod api_keys;
pub mod config;
pub mod display;
pub mod plugins;
pub mod scheduler;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use api_keys::ApiKeys;
pub use config::{Config, KNOWN_PLUGINS};
pub use display::{DisplayConfig, DriverConfig};
pub use plugins::{PluginSettings, PluginsConfig};
pub use scheduler::SchedulerConfig;

//! Main configuration structure and implementation

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ApiKeys, DisplayConfig, PluginsConfig, SchedulerConfig};

/// Renderer names the daemon can build
pub const KNOWN_PLUGINS: [&str; 4] = ["clock", "weather", "prayer", "stock"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    pub display: DisplayConfig,
    pub api_keys: ApiKeys,
    pub plugins: PluginsConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            display: DisplayConfig::default(),
            api_keys: ApiKeys::default(),
            plugins: PluginsConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != "1.0" {
            return Err(anyhow!(
                "Unsupported configuration version: {}",
                self.version
            ));
        }

        if self.plugins.enabled.is_empty() {
            return Err(anyhow!("At least one plugin must be enabled"));
        }

        for name in &self.plugins.enabled {
            if !KNOWN_PLUGINS.contains(&name.as_str()) {
                return Err(anyhow!("Unknown plugin in enabled list: {}", name));
            }
        }

        if !self.plugins.enabled.contains(&self.plugins.default) {
            return Err(anyhow!(
                "Default plugin '{}' is not in the enabled list",
                self.plugins.default
            ));
        }

        if self.display.width == 0 || self.display.height == 0 {
            return Err(anyhow!("Display dimensions must be non-zero"));
        }

        if !matches!(self.display.rotation, 0 | 90 | 180 | 270) {
            return Err(anyhow!(
                "Display rotation must be 0, 90, 180 or 270, got {}",
                self.display.rotation
            ));
        }

        if self.scheduler.tick_secs == 0 {
            return Err(anyhow!("Scheduler tick must be non-zero"));
        }

        Ok(())
    }
}

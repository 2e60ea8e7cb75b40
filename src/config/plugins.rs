//! Plugin enablement and per-renderer settings

use serde::{Deserialize, Serialize};

use crate::plugin::{ClockSettings, PrayerSettings, StockSettings, WeatherSettings};

/// Which plugins run and how each one is tuned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Names admitted to the registry
    pub enabled: Vec<String>,

    /// Plugin rendered on startup
    pub default: String,

    pub settings: PluginSettings,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                "clock".to_string(),
                "weather".to_string(),
                "prayer".to_string(),
                "stock".to_string(),
            ],
            default: "clock".to_string(),
            settings: PluginSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub clock: ClockSettings,
    pub weather: WeatherSettings,
    pub prayer: PrayerSettings,
    pub stock: StockSettings,
}

//! API credentials for the network-backed renderers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openweathermap: String,
    pub finnhub: String,
}

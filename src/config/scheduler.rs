//! Scheduler cadence settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between due-plugin scans
    pub tick_secs: u64,

    /// Upper bound on one renderer invocation, seconds
    pub render_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: 5,
            render_timeout_secs: 30,
        }
    }
}

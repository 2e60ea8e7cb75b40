//! Registry tracking every renderer's lifecycle state and run history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::Renderer;

/// Errors surfaced by registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("plugin '{0}' is already running")]
    AlreadyRunning(String),

    #[error("unknown plugin '{0}'")]
    NotFound(String),

    #[error("plugin '{0}' is already registered")]
    Duplicate(String),
}

/// Lifecycle state of a registered renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Registered and eligible for scheduling
    Idle,

    /// A run is in flight
    Running,

    /// Last run failed; still eligible for scheduling
    Failed,

    /// Excluded from scheduling until re-enabled
    Disabled,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Success,

    /// The renderer itself failed; the display was never touched
    RenderFailed(String),

    /// The frame was produced but the display refused or failed the refresh
    DisplayFailed(String),
}

/// Point-in-time view of one renderer, safe to serialize for status output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginStatus {
    pub name: String,
    pub description: String,
    pub state: PluginState,

    /// True after three or more consecutive failures
    pub degraded: bool,

    pub interval_secs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

const DEGRADED_THRESHOLD: u32 = 3;

struct Entry {
    renderer: Arc<dyn Renderer>,
    state: PluginState,
    last_run_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    consecutive_failures: u32,

    /// Automatic scheduling is paused until this instant after a display
    /// failure, so a sick panel is not hammered every tick.
    suppressed_until: Option<DateTime<Utc>>,
}

impl Entry {
    fn status(&self) -> PluginStatus {
        PluginStatus {
            name: self.renderer.name().to_string(),
            description: self.renderer.description().to_string(),
            state: self.state,
            degraded: self.consecutive_failures >= DEGRADED_THRESHOLD,
            interval_secs: self.renderer.interval().as_secs(),
            last_run_at: self.last_run_at,
            last_success_at: self.last_success_at,
            last_error: self.last_error.clone(),
            consecutive_failures: self.consecutive_failures,
        }
    }
}

/// Shared record of every renderer the daemon knows about.
///
/// Entries keep registration order so status output is stable. All state
/// transitions go through `mark_running` / `mark_result`; the scheduler and
/// the control gateway only ever observe committed snapshots.
pub struct PluginRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a renderer. Names must be unique.
    pub async fn register(&self, renderer: Arc<dyn Renderer>) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.renderer.name() == renderer.name()) {
            return Err(RegistryError::Duplicate(renderer.name().to_string()));
        }
        debug!(plugin = renderer.name(), "registering renderer");
        entries.push(Entry {
            renderer,
            state: PluginState::Idle,
            last_run_at: None,
            last_success_at: None,
            last_error: None,
            consecutive_failures: 0,
            suppressed_until: None,
        });
        Ok(())
    }

    /// Look up the renderer behind a name
    pub async fn renderer(&self, name: &str) -> Result<Arc<dyn Renderer>, RegistryError> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|e| e.renderer.name() == name)
            .map(|e| Arc::clone(&e.renderer))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Transition a plugin to `Running`.
    ///
    /// Fails if a run is already in flight; this is the guard that keeps
    /// two runs of the same plugin from overlapping even when a manual
    /// trigger races the automatic schedule.
    pub async fn mark_running(&self, name: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.renderer.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if entry.state == PluginState::Running {
            return Err(RegistryError::AlreadyRunning(name.to_string()));
        }

        entry.state = PluginState::Running;
        entry.last_run_at = Some(Utc::now());
        entry.suppressed_until = None;
        Ok(())
    }

    /// Commit the result of a run started with `mark_running`
    pub async fn mark_result(&self, name: &str, outcome: RunOutcome) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.renderer.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        match outcome {
            RunOutcome::Success => {
                entry.state = PluginState::Idle;
                entry.last_success_at = Some(Utc::now());
                entry.last_error = None;
                entry.consecutive_failures = 0;
            }
            RunOutcome::RenderFailed(error) => {
                entry.state = PluginState::Failed;
                entry.consecutive_failures += 1;
                if entry.consecutive_failures == DEGRADED_THRESHOLD {
                    warn!(plugin = name, error = %error, "renderer is degraded");
                }
                entry.last_error = Some(error);
            }
            RunOutcome::DisplayFailed(error) => {
                entry.state = PluginState::Failed;
                entry.consecutive_failures += 1;
                // Skip the next automatic firing entirely; the panel failing
                // is not the renderer's fault, so give the hardware a full
                // extra interval before trying it again.
                let interval = chrono::Duration::from_std(entry.renderer.interval())
                    .unwrap_or_else(|_| chrono::Duration::zero());
                entry.suppressed_until = Some(Utc::now() + interval * 2);
                entry.last_error = Some(error);
            }
        }
        Ok(())
    }

    /// Snapshot of every entry in registration order
    pub async fn snapshot(&self) -> Vec<PluginStatus> {
        let entries = self.entries.read().await;
        entries.iter().map(Entry::status).collect()
    }

    /// Snapshot of one entry
    pub async fn status(&self, name: &str) -> Result<PluginStatus, RegistryError> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|e| e.renderer.name() == name)
            .map(Entry::status)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Names of plugins whose interval has elapsed, ordered most-frequent
    /// first so a slow display serves the fast-cadence content first.
    pub async fn due(&self, now: DateTime<Utc>) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut due: Vec<(Duration, String)> = entries
            .iter()
            .filter(|e| {
                if matches!(e.state, PluginState::Running | PluginState::Disabled) {
                    return false;
                }
                if let Some(until) = e.suppressed_until {
                    if now < until {
                        return false;
                    }
                }
                match e.last_run_at {
                    None => true,
                    Some(last) => {
                        let elapsed = (now - last).to_std().unwrap_or_default();
                        elapsed >= e.renderer.interval()
                    }
                }
            })
            .map(|e| (e.renderer.interval(), e.renderer.name().to_string()))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        due.into_iter().map(|(_, name)| name).collect()
    }

    /// Exclude a plugin from scheduling
    pub async fn disable(&self, name: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.renderer.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        entry.state = PluginState::Disabled;
        Ok(())
    }

    /// Re-admit a disabled plugin; failure history is kept
    pub async fn enable(&self, name: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.renderer.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if entry.state == PluginState::Disabled {
            entry.state = PluginState::Idle;
        }
        Ok(())
    }
}

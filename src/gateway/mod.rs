//! Control surface the web UI and CLI drive the daemon through

use std::sync::Arc;
use tracing::{info, warn};

use crate::display::{DisplayArbiter, DisplayError};
use crate::plugin::{PluginRegistry, PluginState, PluginStatus, RegistryError};
use crate::scheduler::SchedulerHandle;

/// Result of asking for a manual run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Queued; the scheduler will run it next
    Accepted,

    /// A run of this plugin is already in flight
    Skipped,

    /// No plugin registered under that name
    NotFound,
}

/// In-process API over the running daemon. Every call answers from
/// committed state or hands work to the scheduler; nothing here blocks on
/// a display refresh.
pub struct ControlGateway {
    scheduler: SchedulerHandle,
    registry: Arc<PluginRegistry>,
    arbiter: Arc<DisplayArbiter>,
}

impl ControlGateway {
    pub fn new(
        scheduler: SchedulerHandle,
        registry: Arc<PluginRegistry>,
        arbiter: Arc<DisplayArbiter>,
    ) -> Self {
        Self {
            scheduler,
            registry,
            arbiter,
        }
    }

    /// Request an immediate run of one plugin.
    ///
    /// Answers from the registry snapshot; the scheduler's own running
    /// guard catches any race this check loses.
    pub async fn trigger_run(&self, plugin: &str) -> TriggerOutcome {
        match self.registry.status(plugin).await {
            Err(RegistryError::NotFound(_)) => return TriggerOutcome::NotFound,
            Err(e) => {
                warn!(plugin, error = %e, "status lookup failed");
                return TriggerOutcome::NotFound;
            }
            Ok(status) if status.state == PluginState::Running => {
                info!(plugin, "manual trigger skipped, already running");
                return TriggerOutcome::Skipped;
            }
            Ok(_) => {}
        }

        match self.scheduler.submit(plugin).await {
            Ok(()) => {
                info!(plugin, "manual trigger accepted");
                TriggerOutcome::Accepted
            }
            Err(e) => {
                warn!(plugin, error = %e, "manual trigger dropped");
                TriggerOutcome::Skipped
            }
        }
    }

    /// Snapshot of every registered plugin
    pub async fn status(&self) -> Vec<PluginStatus> {
        self.registry.snapshot().await
    }

    /// Snapshot of one plugin
    pub async fn plugin_status(&self, plugin: &str) -> Result<PluginStatus, RegistryError> {
        self.registry.status(plugin).await
    }

    /// Take a plugin out of the schedule until re-enabled
    pub async fn disable_plugin(&self, plugin: &str) -> Result<(), RegistryError> {
        self.registry.disable(plugin).await?;
        info!(plugin, "plugin disabled");
        Ok(())
    }

    /// Re-admit a disabled plugin to the schedule
    pub async fn enable_plugin(&self, plugin: &str) -> Result<(), RegistryError> {
        self.registry.enable(plugin).await?;
        info!(plugin, "plugin enabled");
        Ok(())
    }

    /// Blank the display. Goes straight to the arbiter; the scheduler is
    /// not involved and cannot reorder it behind queued renders.
    pub async fn clear(&self) -> Result<(), DisplayError> {
        self.arbiter.clear().await
    }
}

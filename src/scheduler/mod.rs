//! Scheduler loop: decides what renders next and owns the display pipeline

use anyhow::Result;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::display::DisplayArbiter;
use crate::plugin::{PluginRegistry, RunOutcome};

/// Cadence and limits the loop runs under
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between due-plugin scans
    pub tick: Duration,

    /// Upper bound on one renderer invocation
    pub render_timeout: Duration,

    /// Plugin rendered once at startup, before the first tick
    pub default_plugin: String,
}

/// Where a run request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    /// The interval scan found the plugin due
    Automatic,

    /// An operator asked for it through the control gateway
    Manual,
}

/// One unit of work for the loop
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub plugin: String,
    pub origin: RequestOrigin,

    /// When the request entered the queue. Queue position decides run
    /// order; the timestamp lets automatic requests that sat behind slow
    /// refreshes for longer than their own interval be dropped, since the
    /// next scan will find them due again anyway.
    pub submitted_at: chrono::DateTime<Utc>,
}

#[derive(Debug)]
enum IntakeMessage {
    Run(ScheduleRequest),
    Shutdown,
}

/// Cheap handle for submitting work to a running scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    intake: mpsc::Sender<IntakeMessage>,
}

impl SchedulerHandle {
    /// Queue a manual run. Fails only when the scheduler has stopped.
    pub async fn submit(&self, plugin: &str) -> Result<()> {
        let request = ScheduleRequest {
            plugin: plugin.to_string(),
            origin: RequestOrigin::Manual,
            submitted_at: Utc::now(),
        };
        self.intake
            .send(IntakeMessage::Run(request))
            .await
            .map_err(|_| anyhow::anyhow!("scheduler is not running"))
    }

    /// Ask the loop to finish its current run and exit
    pub async fn shutdown(&self) -> Result<()> {
        self.intake
            .send(IntakeMessage::Shutdown)
            .await
            .map_err(|_| anyhow::anyhow!("scheduler is not running"))
    }
}

/// Single-task scheduler. All renders and display refreshes flow through
/// `run`, so mutual exclusion over the panel needs no further locking.
pub struct Scheduler {
    config: SchedulerConfig,
    registry: Arc<PluginRegistry>,
    arbiter: Arc<DisplayArbiter>,
    intake: mpsc::Receiver<IntakeMessage>,
    pending: VecDeque<ScheduleRequest>,
    shutting_down: bool,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        registry: Arc<PluginRegistry>,
        arbiter: Arc<DisplayArbiter>,
    ) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(32);
        (
            Self {
                config,
                registry,
                arbiter,
                intake: rx,
                pending: VecDeque::new(),
                shutting_down: false,
            },
            SchedulerHandle { intake: tx },
        )
    }

    /// Drive the loop until shutdown. Renders the default plugin once
    /// before the first tick so the panel never sits blank.
    pub async fn run(mut self) {
        info!(
            default_plugin = %self.config.default_plugin,
            tick = ?self.config.tick,
            "scheduler starting"
        );

        self.enqueue(ScheduleRequest {
            plugin: self.config.default_plugin.clone(),
            origin: RequestOrigin::Automatic,
            submitted_at: Utc::now(),
        });
        self.drain_pending().await;

        let mut tick = interval(self.config.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tick.reset();

        while !self.shutting_down {
            // Manual triggers take priority over the interval scan.
            tokio::select! {
                biased;

                message = self.intake.recv() => match message {
                    Some(IntakeMessage::Run(request)) => self.enqueue(request),
                    Some(IntakeMessage::Shutdown) | None => {
                        self.shutting_down = true;
                    }
                },

                _ = tick.tick() => {
                    for plugin in self.registry.due(Utc::now()).await {
                        self.enqueue(ScheduleRequest {
                            plugin,
                            origin: RequestOrigin::Automatic,
                            submitted_at: Utc::now(),
                        });
                    }
                }
            }

            // Absorb anything else already queued before rendering, so a
            // shutdown or a newer manual trigger is not stuck behind work.
            while let Ok(message) = self.intake.try_recv() {
                match message {
                    IntakeMessage::Run(request) => self.enqueue(request),
                    IntakeMessage::Shutdown => self.shutting_down = true,
                }
            }

            if self.shutting_down {
                break;
            }
            self.drain_pending().await;
        }

        info!("scheduler stopped");
    }

    /// Queue one request. Manual requests jump the queue and supersede any
    /// pending request for the same plugin; duplicate automatic requests
    /// are dropped.
    fn enqueue(&mut self, request: ScheduleRequest) {
        match request.origin {
            RequestOrigin::Manual => {
                self.pending.retain(|r| r.plugin != request.plugin);
                self.pending.push_front(request);
            }
            RequestOrigin::Automatic => {
                if self.pending.iter().any(|r| r.plugin == request.plugin) {
                    return;
                }
                self.pending.push_back(request);
            }
        }
    }

    async fn drain_pending(&mut self) {
        while let Some(request) = self.pending.pop_front() {
            self.process(request).await;

            // Shutdown may have arrived while the display was refreshing.
            while let Ok(message) = self.intake.try_recv() {
                match message {
                    IntakeMessage::Run(r) => self.enqueue(r),
                    IntakeMessage::Shutdown => self.shutting_down = true,
                }
            }
            if self.shutting_down {
                self.pending.clear();
                return;
            }
        }
    }

    /// One full run: look up, render with a deadline, push to the display,
    /// commit the outcome. A failure in any stage never escapes the loop.
    async fn process(&self, request: ScheduleRequest) {
        let name = request.plugin.as_str();

        let renderer = match self.registry.renderer(name).await {
            Ok(renderer) => renderer,
            Err(e) => {
                warn!(plugin = name, error = %e, "dropping request for unknown plugin");
                return;
            }
        };

        // An automatic request that aged past its own interval is stale;
        // the due scan will requeue the plugin with fresh timing.
        if request.origin == RequestOrigin::Automatic {
            let age = (Utc::now() - request.submitted_at)
                .to_std()
                .unwrap_or_default();
            if age > renderer.interval() {
                debug!(plugin = name, age = ?age, "dropping stale queued request");
                return;
            }
        }

        // Claims the Running slot; loses the race if another path already
        // started this plugin.
        if let Err(e) = self.registry.mark_running(name).await {
            debug!(plugin = name, error = %e, "skipping, plugin already running");
            return;
        }

        debug!(plugin = name, origin = ?request.origin, "rendering");
        let outcome = match timeout(self.config.render_timeout, renderer.render()).await {
            Err(_) => {
                error!(plugin = name, timeout = ?self.config.render_timeout, "render timed out");
                RunOutcome::RenderFailed(format!(
                    "render timed out after {:?}",
                    self.config.render_timeout
                ))
            }
            Ok(Err(e)) => {
                error!(plugin = name, error = %format!("{e:#}"), "render failed");
                RunOutcome::RenderFailed(format!("{e:#}"))
            }
            Ok(Ok(frame)) => match self.arbiter.show(frame).await {
                Ok(()) => {
                    info!(plugin = name, "display updated");
                    RunOutcome::Success
                }
                Err(e) => {
                    error!(plugin = name, error = %e, "display refresh failed");
                    RunOutcome::DisplayFailed(e.to_string())
                }
            },
        };

        if let Err(e) = self.registry.mark_result(name, outcome).await {
            error!(plugin = name, error = %e, "failed to record run outcome");
        }
    }
}

//! einkd library
//!
//! Daemon for driving a slow-refresh e-ink info panel: plugins render
//! full frames (clock, weather, prayer times, stock quotes), a scheduler
//! decides what runs when, and an arbiter serializes access to the display.

pub mod cli;
pub mod config;
pub mod display;
pub mod gateway;
pub mod plugin;
pub mod scheduler;

pub use config::Config;
pub use display::{BusyPolicy, ColorMode, DisplayArbiter, DisplayError, Frame, FrameSpec};
pub use gateway::{ControlGateway, TriggerOutcome};
pub use plugin::{PluginRegistry, PluginState, PluginStatus, Renderer};
pub use scheduler::{Scheduler, SchedulerHandle};

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use config::DriverConfig;
use display::{DisplayDriver, FileDriver};
use plugin::{ClockRenderer, PrayerRenderer, RunOutcome, StockRenderer, WeatherRenderer};

/// Main application context that wires config, registry and display together
pub struct InfoDisplay {
    config: Config,
    registry: Arc<PluginRegistry>,
    arbiter: Arc<DisplayArbiter>,
}

/// A started daemon: the scheduler task plus the gateway to talk to it
pub struct Daemon {
    gateway: ControlGateway,
    handle: SchedulerHandle,
    task: JoinHandle<()>,
}

impl Daemon {
    pub fn gateway(&self) -> &ControlGateway {
        &self.gateway
    }

    /// Ask the scheduler to finish its current run and wait for it to exit
    pub async fn stop(self) -> Result<()> {
        if self.handle.shutdown().await.is_err() {
            warn!("scheduler already stopped");
        }
        self.task.await.context("scheduler task panicked")?;
        Ok(())
    }
}

impl InfoDisplay {
    /// Build the context from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let spec = config.display.frame_spec();
        let driver: Box<dyn DisplayDriver> = match &config.display.driver {
            DriverConfig::File { output_dir } => Box::new(FileDriver::new(output_dir.clone(), spec)),
        };
        let arbiter = Arc::new(DisplayArbiter::new(
            driver,
            config.display.busy_policy,
            Duration::from_secs(config.display.op_timeout_secs),
        ));

        Ok(Self {
            config,
            registry: Arc::new(PluginRegistry::new()),
            arbiter,
        })
    }

    fn build_renderer(&self, name: &str) -> Result<Arc<dyn Renderer>> {
        let spec = self.config.display.frame_spec();
        let settings = &self.config.plugins.settings;
        let renderer: Arc<dyn Renderer> = match name {
            "clock" => Arc::new(ClockRenderer::new(spec, settings.clock.clone())),
            "weather" => Arc::new(WeatherRenderer::new(
                spec,
                settings.weather.clone(),
                self.config.api_keys.openweathermap.clone(),
            )?),
            "prayer" => Arc::new(PrayerRenderer::new(spec, settings.prayer.clone())?),
            "stock" => Arc::new(StockRenderer::new(
                spec,
                settings.stock.clone(),
                self.config.api_keys.finnhub.clone(),
            )?),
            other => return Err(anyhow!("unknown plugin: {other}")),
        };
        Ok(renderer)
    }

    /// Register every enabled plugin with the registry
    pub async fn register_enabled(&self) -> Result<()> {
        for name in &self.config.plugins.enabled {
            let renderer = self.build_renderer(name)?;
            self.registry
                .register(renderer)
                .await
                .with_context(|| format!("failed to register plugin {name}"))?;
            info!(plugin = name.as_str(), "plugin registered");
        }
        Ok(())
    }

    /// Start the scheduler and hand back the daemon handle
    pub async fn start(self) -> Result<Daemon> {
        self.register_enabled().await?;

        let (scheduler, handle) = Scheduler::new(
            scheduler::SchedulerConfig {
                tick: Duration::from_secs(self.config.scheduler.tick_secs),
                render_timeout: Duration::from_secs(self.config.scheduler.render_timeout_secs),
                default_plugin: self.config.plugins.default.clone(),
            },
            Arc::clone(&self.registry),
            Arc::clone(&self.arbiter),
        );

        let gateway = ControlGateway::new(
            handle.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.arbiter),
        );
        let task = tokio::spawn(scheduler.run());

        Ok(Daemon {
            gateway,
            handle,
            task,
        })
    }

    /// Render one plugin once and push it to the display, outside the
    /// scheduler. Used by the one-shot CLI mode.
    pub async fn run_once(&self, plugin: Option<&str>) -> Result<()> {
        self.register_enabled().await?;

        let name = plugin.unwrap_or(&self.config.plugins.default);
        let renderer = self.registry.renderer(name).await?;

        self.registry.mark_running(name).await?;
        let (outcome, result) = match renderer.render().await {
            Err(e) => {
                let message = format!("{e:#}");
                (RunOutcome::RenderFailed(message), Err(e))
            }
            Ok(frame) => match self.arbiter.show(frame).await {
                Ok(()) => (RunOutcome::Success, Ok(())),
                Err(e) => (
                    RunOutcome::DisplayFailed(e.to_string()),
                    Err(anyhow!("display refresh failed: {e}")),
                ),
            },
        };
        self.registry.mark_result(name, outcome).await?;
        result
    }

    /// Blank the display
    pub async fn clear(&self) -> Result<()> {
        self.arbiter
            .clear()
            .await
            .map_err(|e| anyhow!("display clear failed: {e}"))
    }

    /// Push the built-in test pattern to the display
    pub async fn show_test_pattern(&self) -> Result<()> {
        let frame = display::test_pattern(self.config.display.frame_spec());
        self.arbiter
            .show(frame)
            .await
            .map_err(|e| anyhow!("display refresh failed: {e}"))
    }

    /// Snapshot of every registered plugin
    pub async fn status_snapshot(&self) -> Vec<PluginStatus> {
        self.registry.snapshot().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

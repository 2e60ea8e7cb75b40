use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use einkd::display::{
    BusyPolicy, ColorMode, DisplayArbiter, DisplayDriver, Frame, FrameSpec,
};
use einkd::gateway::{ControlGateway, TriggerOutcome};
use einkd::plugin::{PluginRegistry, PluginState, Renderer};
use einkd::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};

fn spec() -> FrameSpec {
    FrameSpec {
        width: 32,
        height: 32,
        color_mode: ColorMode::Monochrome,
    }
}

enum Behavior {
    /// Render immediately
    Instant,
    /// Fail every render
    Fail,
    /// Wait for a notification before finishing each render
    Gated(Arc<Notify>),
}

struct TestRenderer {
    name: &'static str,
    interval: Duration,
    behavior: Behavior,
    renders: AtomicUsize,
}

impl TestRenderer {
    fn new(name: &'static str, interval: Duration, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            interval,
            behavior,
            renders: AtomicUsize::new(0),
        })
    }

    fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for TestRenderer {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test renderer"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn render(&self) -> Result<Frame> {
        match &self.behavior {
            Behavior::Instant => {}
            Behavior::Fail => {
                self.renders.fetch_add(1, Ordering::SeqCst);
                bail!("upstream API unavailable");
            }
            Behavior::Gated(gate) => gate.notified().await,
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::new(spec()))
    }
}

struct CountingDriver {
    writes: Arc<AtomicUsize>,
}

#[async_trait]
impl DisplayDriver for CountingDriver {
    async fn write(&mut self, _frame: &Frame) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

struct Harness {
    registry: Arc<PluginRegistry>,
    arbiter: Arc<DisplayArbiter>,
    writes: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        let writes = Arc::new(AtomicUsize::new(0));
        let driver = CountingDriver {
            writes: Arc::clone(&writes),
        };
        Self {
            registry: Arc::new(PluginRegistry::new()),
            arbiter: Arc::new(DisplayArbiter::new(
                Box::new(driver),
                BusyPolicy::Block,
                Duration::from_secs(5),
            )),
            writes,
        }
    }

    fn start(&self, tick: Duration, default_plugin: &str) -> (SchedulerHandle, tokio::task::JoinHandle<()>) {
        self.start_with_render_timeout(tick, default_plugin, Duration::from_secs(5))
    }

    fn start_with_render_timeout(
        &self,
        tick: Duration,
        default_plugin: &str,
        render_timeout: Duration,
    ) -> (SchedulerHandle, tokio::task::JoinHandle<()>) {
        let (scheduler, handle) = Scheduler::new(
            SchedulerConfig {
                tick,
                render_timeout,
                default_plugin: default_plugin.to_string(),
            },
            Arc::clone(&self.registry),
            Arc::clone(&self.arbiter),
        );
        let task = tokio::spawn(scheduler.run());
        (handle, task)
    }

    fn gateway(&self, handle: SchedulerHandle) -> ControlGateway {
        ControlGateway::new(handle, Arc::clone(&self.registry), Arc::clone(&self.arbiter))
    }
}

#[tokio::test]
async fn startup_renders_default_plugin_only() {
    let harness = Harness::new();
    let clock = TestRenderer::new("clock", Duration::from_secs(3600), Behavior::Instant);
    let weather = TestRenderer::new("weather", Duration::from_secs(3600), Behavior::Instant);
    harness.registry.register(clock.clone()).await.unwrap();
    harness.registry.register(weather.clone()).await.unwrap();

    // Long tick so only the startup seed runs.
    let (handle, task) = harness.start(Duration::from_secs(3600), "clock");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(clock.render_count(), 1);
    assert_eq!(weather.render_count(), 0);
    assert_eq!(harness.writes.load(Ordering::SeqCst), 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn due_plugins_are_rendered_on_the_tick() {
    let harness = Harness::new();
    let clock = TestRenderer::new("clock", Duration::from_millis(1), Behavior::Instant);
    harness.registry.register(clock.clone()).await.unwrap();

    let (handle, task) = harness.start(Duration::from_millis(20), "clock");
    tokio::time::sleep(Duration::from_millis(300)).await;

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    // Seed render plus several tick-driven renders.
    assert!(clock.render_count() >= 3, "got {}", clock.render_count());
    assert_eq!(harness.writes.load(Ordering::SeqCst), clock.render_count());
}

#[tokio::test]
async fn manual_trigger_while_running_is_skipped() {
    let harness = Harness::new();
    let gate = Arc::new(Notify::new());
    let slow = TestRenderer::new(
        "slow",
        Duration::from_secs(3600),
        Behavior::Gated(Arc::clone(&gate)),
    );
    harness.registry.register(slow.clone()).await.unwrap();

    let (handle, task) = harness.start(Duration::from_secs(3600), "slow");
    let gateway = harness.gateway(handle.clone());

    // Wait until the seed render is in flight and gated.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = harness.registry.status("slow").await.unwrap();
    assert_eq!(status.state, PluginState::Running);

    assert_eq!(gateway.trigger_run("slow").await, TriggerOutcome::Skipped);

    // Let the in-flight render finish; the plugin becomes triggerable again.
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.trigger_run("slow").await, TriggerOutcome::Accepted);

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(slow.render_count(), 2);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn unknown_plugin_is_reported_not_found() {
    let harness = Harness::new();
    let clock = TestRenderer::new("clock", Duration::from_secs(3600), Behavior::Instant);
    harness.registry.register(clock).await.unwrap();

    let (handle, task) = harness.start(Duration::from_secs(3600), "clock");
    let gateway = harness.gateway(handle.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(gateway.trigger_run("news").await, TriggerOutcome::NotFound);

    // The registered plugin is untouched by the bad request.
    let status = harness.registry.status("clock").await.unwrap();
    assert_eq!(status.state, PluginState::Idle);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn failing_plugin_degrades_without_stopping_the_daemon() {
    let harness = Harness::new();
    let bad = TestRenderer::new("bad", Duration::from_millis(1), Behavior::Fail);
    let good = TestRenderer::new("good", Duration::from_millis(1), Behavior::Instant);
    harness.registry.register(bad.clone()).await.unwrap();
    harness.registry.register(good.clone()).await.unwrap();

    let (handle, task) = harness.start(Duration::from_millis(20), "good");
    tokio::time::sleep(Duration::from_millis(300)).await;

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    let status = harness.registry.status("bad").await.unwrap();
    assert_eq!(status.state, PluginState::Failed);
    assert!(status.degraded);
    assert!(status.consecutive_failures >= 3);
    assert!(status
        .last_error
        .as_deref()
        .unwrap()
        .contains("upstream API unavailable"));
    assert!(status.last_success_at.is_none());

    // The healthy plugin kept rendering and only its frames hit the panel.
    assert!(good.render_count() >= 3);
    assert_eq!(harness.writes.load(Ordering::SeqCst), good.render_count());
}

#[tokio::test]
async fn render_timeout_marks_plugin_failed_without_touching_the_display() {
    let harness = Harness::new();
    let gate = Arc::new(Notify::new());
    // Never notified, so every render hangs until the deadline cuts it off.
    let stuck = TestRenderer::new(
        "stuck",
        Duration::from_secs(3600),
        Behavior::Gated(Arc::clone(&gate)),
    );
    harness.registry.register(stuck.clone()).await.unwrap();

    let (handle, task) = harness.start_with_render_timeout(
        Duration::from_secs(3600),
        "stuck",
        Duration::from_millis(50),
    );
    tokio::time::sleep(Duration::from_millis(300)).await;

    let status = harness.registry.status("stuck").await.unwrap();
    assert_eq!(status.state, PluginState::Failed);
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_error.as_deref().unwrap().contains("timed out"));
    assert!(status.last_success_at.is_none());

    // The render never completed and no frame reached the panel.
    assert_eq!(stuck.render_count(), 0);
    assert_eq!(harness.writes.load(Ordering::SeqCst), 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_new_renders_and_rejects_triggers() {
    let harness = Harness::new();
    let clock = TestRenderer::new("clock", Duration::from_millis(1), Behavior::Instant);
    harness.registry.register(clock.clone()).await.unwrap();

    let (handle, task) = harness.start(Duration::from_millis(20), "clock");
    tokio::time::sleep(Duration::from_millis(100)).await;

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    let gateway = harness.gateway(handle.clone());
    let rendered_before = clock.render_count();

    // The intake channel is closed; triggers cannot be queued any more.
    assert_eq!(gateway.trigger_run("clock").await, TriggerOutcome::Skipped);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(clock.render_count(), rendered_before);
}

#[tokio::test]
async fn disabled_plugin_is_left_out_of_the_schedule() {
    let harness = Harness::new();
    let clock = TestRenderer::new("clock", Duration::from_millis(1), Behavior::Instant);
    let stock = TestRenderer::new("stock", Duration::from_millis(1), Behavior::Instant);
    harness.registry.register(clock.clone()).await.unwrap();
    harness.registry.register(stock.clone()).await.unwrap();

    let (handle, task) = harness.start(Duration::from_millis(20), "clock");
    let gateway = harness.gateway(handle.clone());

    gateway.disable_plugin("stock").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let disabled_renders = stock.render_count();
    assert!(clock.render_count() >= 3);

    gateway.enable_plugin("stock").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(stock.render_count() > disabled_renders);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn clear_goes_straight_to_the_display() {
    let harness = Harness::new();
    let clock = TestRenderer::new("clock", Duration::from_secs(3600), Behavior::Instant);
    harness.registry.register(clock).await.unwrap();

    let (handle, task) = harness.start(Duration::from_secs(3600), "clock");
    let gateway = harness.gateway(handle.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;

    gateway.clear().await.unwrap();

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

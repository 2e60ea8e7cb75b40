//! Renderer contract and the built-in content renderers

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::display::Frame;

pub mod clock;
pub mod prayer;
pub mod registry;
pub mod stock;
pub mod weather;

pub use clock::{ClockRenderer, ClockSettings};
pub use prayer::{PrayerRenderer, PrayerSettings};
pub use registry::{PluginRegistry, PluginState, PluginStatus, RegistryError, RunOutcome};
pub use stock::{StockRenderer, StockSettings};
pub use weather::{WeatherRenderer, WeatherSettings};

/// Contract every content renderer satisfies.
///
/// A renderer produces one finished frame per invocation or fails; it never
/// touches the display itself and shares no mutable state with other
/// renderers. The scheduler owns timing and mutual exclusion.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Unique registry key
    fn name(&self) -> &str;

    /// Human-readable summary for status reporting
    fn description(&self) -> &str;

    /// Cadence between automatic runs
    fn interval(&self) -> Duration;

    /// Produce one frame. Network and parse errors come back as `Err`;
    /// the caller records them without stopping the daemon.
    async fn render(&self) -> Result<Frame>;
}

//! Exclusive-access wrapper around the physical display

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::debug;

use super::driver::DisplayDriver;
use super::Frame;

/// Failures surfaced by the arbiter
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display is busy with another refresh")]
    Busy,

    #[error("display operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("hardware refresh failed: {0}")]
    Hardware(String),
}

/// What to do when a call arrives while a refresh is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Wait for the in-flight refresh, up to the operation timeout
    Block,

    /// Fail immediately with `Busy`
    Reject,
}

impl Default for BusyPolicy {
    fn default() -> Self {
        BusyPolicy::Block
    }
}

/// Serializes all access to the panel: one in-flight hardware operation at
/// a time. A call either completes a full refresh or fails; the previous
/// image is assumed to remain on failure (e-ink retains it physically).
pub struct DisplayArbiter {
    driver: Mutex<Box<dyn DisplayDriver>>,
    busy_policy: BusyPolicy,
    op_timeout: Duration,
}

impl DisplayArbiter {
    pub fn new(driver: Box<dyn DisplayDriver>, busy_policy: BusyPolicy, op_timeout: Duration) -> Self {
        Self {
            driver: Mutex::new(driver),
            busy_policy,
            op_timeout,
        }
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, Box<dyn DisplayDriver>>, DisplayError> {
        match self.busy_policy {
            BusyPolicy::Reject => self.driver.try_lock().map_err(|_| DisplayError::Busy),
            BusyPolicy::Block => timeout(self.op_timeout, self.driver.lock())
                .await
                .map_err(|_| DisplayError::Busy),
        }
    }

    /// Push one frame to the panel. Consumes the frame; nothing is cached.
    pub async fn show(&self, frame: Frame) -> Result<(), DisplayError> {
        let mut driver = self.acquire().await?;
        debug!("starting display refresh");
        match timeout(self.op_timeout, driver.write(&frame)).await {
            Err(_) => Err(DisplayError::Timeout(self.op_timeout)),
            Ok(Err(e)) => Err(DisplayError::Hardware(format!("{e:#}"))),
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Blank the panel
    pub async fn clear(&self) -> Result<(), DisplayError> {
        let mut driver = self.acquire().await?;
        debug!("clearing display");
        match timeout(self.op_timeout, driver.clear()).await {
            Err(_) => Err(DisplayError::Timeout(self.op_timeout)),
            Ok(Err(e)) => Err(DisplayError::Hardware(format!("{e:#}"))),
            Ok(Ok(())) => Ok(()),
        }
    }
}

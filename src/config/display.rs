//! Display and panel configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::display::{BusyPolicy, ColorMode, FrameSpec};

/// Which driver backs the display arbiter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverConfig {
    /// Save frames as PNGs instead of driving a panel
    File { output_dir: PathBuf },
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig::File {
            output_dir: PathBuf::from("frames"),
        }
    }
}

/// Panel geometry and refresh behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,

    /// Rotation in degrees, one of 0/90/180/270
    pub rotation: u32,

    pub driver: DriverConfig,
    pub busy_policy: BusyPolicy,

    /// Upper bound on one hardware refresh, seconds
    pub op_timeout_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            color_mode: ColorMode::SevenColor,
            rotation: 0,
            driver: DriverConfig::default(),
            busy_policy: BusyPolicy::default(),
            op_timeout_secs: 60,
        }
    }
}

impl DisplayConfig {
    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec {
            width: self.width,
            height: self.height,
            color_mode: self.color_mode,
        }
    }
}

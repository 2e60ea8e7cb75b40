//! Digital clock renderer

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Renderer;
use crate::display::draw::{self, palette};
use crate::display::{Frame, FrameSpec};

/// Settings for the clock renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    pub show_seconds: bool,
    pub format_24h: bool,
    pub update_interval: u64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            show_seconds: false,
            format_24h: true,
            update_interval: 60,
        }
    }
}

pub struct ClockRenderer {
    spec: FrameSpec,
    settings: ClockSettings,
}

impl ClockRenderer {
    pub fn new(spec: FrameSpec, settings: ClockSettings) -> Self {
        Self { spec, settings }
    }

    fn time_string(&self) -> String {
        let now = Local::now();
        let pattern = match (self.settings.format_24h, self.settings.show_seconds) {
            (true, true) => "%H:%M:%S",
            (true, false) => "%H:%M",
            (false, true) => "%I:%M:%S %p",
            (false, false) => "%I:%M %p",
        };
        now.format(pattern).to_string()
    }
}

#[async_trait]
impl Renderer for ClockRenderer {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Digital clock with date"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.update_interval)
    }

    async fn render(&self) -> Result<Frame> {
        let mut frame = Frame::new(self.spec);
        let now = Local::now();

        let body_y = draw::header(&mut frame, "Clock");

        draw::text_centered(
            &mut frame,
            &self.time_string(),
            body_y + 80,
            &draw::TITLE_FONT,
            palette::BLACK,
        );
        draw::text_centered(
            &mut frame,
            &now.format("%B %d, %Y").to_string(),
            body_y + 130,
            &draw::EMPHASIS_FONT,
            palette::BLUE,
        );
        draw::text_centered(
            &mut frame,
            &now.format("%A").to_string(),
            body_y + 160,
            &draw::BODY_FONT,
            palette::GREEN,
        );

        draw::footer(&mut frame, &format!("Updated: {}", now.format("%H:%M")));
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ColorMode;

    fn spec() -> FrameSpec {
        FrameSpec {
            width: 400,
            height: 300,
            color_mode: ColorMode::SevenColor,
        }
    }

    #[tokio::test]
    async fn renders_a_non_blank_frame() {
        let renderer = ClockRenderer::new(spec(), ClockSettings::default());
        let frame = renderer.render().await.unwrap();

        let blank = (0..frame.height())
            .flat_map(|y| (0..frame.width()).map(move |x| (x, y)))
            .all(|(x, y)| frame.pixel(x, y) == Some(palette::WHITE));
        assert!(!blank);
    }

    #[test]
    fn default_interval_is_one_minute() {
        let renderer = ClockRenderer::new(spec(), ClockSettings::default());
        assert_eq!(renderer.interval(), Duration::from_secs(60));
    }

    #[test]
    fn twelve_hour_format_includes_meridiem() {
        let mut settings = ClockSettings::default();
        settings.format_24h = false;
        let renderer = ClockRenderer::new(spec(), settings);
        let s = renderer.time_string();
        assert!(s.ends_with("AM") || s.ends_with("PM"));
    }
}

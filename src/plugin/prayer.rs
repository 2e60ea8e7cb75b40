//! Daily prayer schedule from the AlAdhan timings API

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveTime};
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::{Primitive, PrimitiveStyle, Rectangle};
use embedded_graphics::Drawable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::Renderer;
use crate::display::draw::{self, palette};
use crate::display::{Frame, FrameSpec};

const TIMINGS_URL: &str = "http://api.aladhan.com/v1/timings";

/// The five daily prayers, in order, with their display names
const PRAYERS: [(&str, &str); 5] = [
    ("Fajr", "Dawn"),
    ("Dhuhr", "Noon"),
    ("Asr", "Afternoon"),
    ("Maghrib", "Sunset"),
    ("Isha", "Night"),
];

/// Settings for the prayer times renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerSettings {
    pub latitude: f64,
    pub longitude: f64,
    /// Calculation method id; 1 is Islamic Society of North America
    pub method: u32,
    pub update_interval: u64,
}

impl Default for PrayerSettings {
    fn default() -> Self {
        Self {
            latitude: 38.903481,
            longitude: -77.262817,
            method: 1,
            update_interval: 3600,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimingsResponse {
    data: TimingsData,
}

#[derive(Debug, Deserialize)]
struct TimingsData {
    timings: HashMap<String, String>,
    #[serde(default)]
    date: Option<DateInfo>,
}

#[derive(Debug, Deserialize)]
struct DateInfo {
    #[serde(default)]
    hijri: Option<HijriDate>,
}

#[derive(Debug, Deserialize)]
struct HijriDate {
    date: String,
}

/// Next prayer relative to the current local time. Falls back to tomorrow's
/// Fajr once every prayer of the day has passed.
fn next_prayer(timings: &HashMap<String, String>, now: NaiveTime) -> (&'static str, String, bool) {
    for (key, display) in PRAYERS {
        if let Some(time) = timings.get(key) {
            if let Ok(parsed) = NaiveTime::parse_from_str(time, "%H:%M") {
                if parsed > now {
                    return (display, time.clone(), true);
                }
            }
        }
    }
    let fajr = timings.get("Fajr").cloned().unwrap_or_default();
    ("Dawn", fajr, false)
}

pub struct PrayerRenderer {
    spec: FrameSpec,
    settings: PrayerSettings,
    client: reqwest::Client,
}

impl PrayerRenderer {
    pub fn new(spec: FrameSpec, settings: PrayerSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            spec,
            settings,
            client,
        })
    }

    async fn fetch_timings(&self) -> Result<TimingsData> {
        let response = self
            .client
            .get(TIMINGS_URL)
            .query(&[
                ("latitude", self.settings.latitude.to_string()),
                ("longitude", self.settings.longitude.to_string()),
                ("method", self.settings.method.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
            .context("prayer times request failed")?
            .error_for_status()
            .context("prayer times API returned an error status")?;
        let body: TimingsResponse = response.json().await.context("invalid prayer times response")?;
        Ok(body.data)
    }
}

#[async_trait]
impl Renderer for PrayerRenderer {
    fn name(&self) -> &str {
        "prayer"
    }

    fn description(&self) -> &str {
        "Islamic prayer times"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.update_interval)
    }

    async fn render(&self) -> Result<Frame> {
        let data = self.fetch_timings().await?;
        let now = Local::now();

        let mut frame = Frame::new(self.spec);

        let mut title = "Prayer Times".to_string();
        if let Some(hijri) = data.date.as_ref().and_then(|d| d.hijri.as_ref()) {
            title = format!("Prayer Times - {}", hijri.date);
        }
        let body_y = draw::header(&mut frame, &title);

        draw::text_centered(
            &mut frame,
            &now.format("%A, %B %d, %Y").to_string(),
            body_y + 16,
            &draw::BODY_FONT,
            palette::BLUE,
        );

        let (next_name, next_time, is_today) = next_prayer(&data.timings, now.time());

        // Two-column table, next prayer highlighted in green.
        let name_x = self.spec.width as i32 / 4;
        let time_x = self.spec.width as i32 * 5 / 8;
        let table_y = body_y + 50;

        draw::text_at(
            &mut frame,
            "Prayer",
            Point::new(name_x, table_y),
            &draw::EMPHASIS_FONT,
            palette::BLACK,
        );
        draw::text_at(
            &mut frame,
            "Time",
            Point::new(time_x, table_y),
            &draw::EMPHASIS_FONT,
            palette::BLACK,
        );

        for (i, (key, display)) in PRAYERS.iter().enumerate() {
            let y = table_y + 28 + i as i32 * 26;
            let time = data.timings.get(*key).map(String::as_str).unwrap_or("N/A");
            let color = if *display == next_name {
                palette::GREEN
            } else {
                palette::BLACK
            };
            draw::text_at(&mut frame, display, Point::new(name_x, y), &draw::BODY_FONT, color);
            draw::text_at(&mut frame, time, Point::new(time_x, y), &draw::BODY_FONT, color);
        }

        if !next_time.is_empty() {
            let box_y = table_y + 28 + PRAYERS.len() as i32 * 26 + 16;
            let box_width = self.spec.width.saturating_sub(120);
            Rectangle::new(Point::new(60, box_y), Size::new(box_width, 56))
                .into_styled(PrimitiveStyle::with_stroke(palette::GREEN, 3))
                .draw(&mut frame)
                .ok();

            let mut info = format!("Next: {} at {}", next_name, next_time);
            if !is_today {
                info.push_str(" (Tomorrow)");
            }
            draw::text_centered(&mut frame, &info, box_y + 34, &draw::BODY_FONT, palette::BLACK);
        }

        draw::footer(
            &mut frame,
            &format!(
                "Location: {:.2}, {:.2}",
                self.settings.latitude, self.settings.longitude
            ),
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings() -> HashMap<String, String> {
        [
            ("Fajr", "05:12"),
            ("Dhuhr", "12:30"),
            ("Asr", "16:05"),
            ("Maghrib", "19:40"),
            ("Isha", "21:02"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn next_prayer_mid_afternoon_is_asr() {
        let now = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let (name, time, today) = next_prayer(&timings(), now);
        assert_eq!(name, "Afternoon");
        assert_eq!(time, "16:05");
        assert!(today);
    }

    #[test]
    fn next_prayer_after_isha_wraps_to_fajr_tomorrow() {
        let now = NaiveTime::from_hms_opt(22, 30, 0).unwrap();
        let (name, time, today) = next_prayer(&timings(), now);
        assert_eq!(name, "Dawn");
        assert_eq!(time, "05:12");
        assert!(!today);
    }

    #[test]
    fn parses_timings_payload() {
        let payload = r#"{
            "data": {
                "timings": {"Fajr": "05:12", "Dhuhr": "12:30"},
                "date": {"hijri": {"date": "09-02-1448"}}
            }
        }"#;
        let body: TimingsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(body.data.timings.get("Fajr").unwrap(), "05:12");
        assert_eq!(body.data.date.unwrap().hijri.unwrap().date, "09-02-1448");
    }
}

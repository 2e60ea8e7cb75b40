//! Current conditions and short forecast from OpenWeatherMap

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use embedded_graphics::prelude::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Renderer;
use crate::display::draw::{self, palette};
use crate::display::{Frame, FrameSpec};

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Settings for the weather renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// OpenWeatherMap city id (defaults to Washington, DC)
    pub city_id: u64,
    /// "imperial" or "metric"
    pub units: String,
    pub update_interval: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            city_id: 4791160,
            units: "imperial".to_string(),
            update_interval: 1800,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: String,
    main: MainReadings,
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Wind,
    #[serde(default)]
    visibility: u32,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: u32,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastReadings,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct ForecastReadings {
    temp: f64,
}

pub struct WeatherRenderer {
    spec: FrameSpec,
    settings: WeatherSettings,
    api_key: String,
    client: reqwest::Client,
}

impl WeatherRenderer {
    pub fn new(spec: FrameSpec, settings: WeatherSettings, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            spec,
            settings,
            api_key,
            client,
        })
    }

    async fn fetch_current(&self) -> Result<CurrentWeather> {
        let response = self
            .client
            .get(CURRENT_URL)
            .query(&[
                ("id", self.settings.city_id.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.settings.units.clone()),
            ])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather API returned an error status")?;
        response.json().await.context("invalid weather response")
    }

    /// Forecast is best effort; the frame renders without it.
    async fn fetch_forecast(&self) -> Option<Forecast> {
        let response = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("id", self.settings.city_id.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.settings.units.clone()),
                ("cnt", "8".to_string()),
            ])
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        response.json().await.ok()
    }
}

/// Compass direction for a wind bearing in degrees
pub(crate) fn wind_direction(degrees: f64) -> &'static str {
    const DIRECTIONS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let index = ((degrees / 22.5).round() as usize) % 16;
    DIRECTIONS[index]
}

#[async_trait]
impl Renderer for WeatherRenderer {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Current weather and forecast"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.update_interval)
    }

    async fn render(&self) -> Result<Frame> {
        if self.api_key.is_empty() {
            bail!("no OpenWeatherMap API key configured");
        }

        let current = self.fetch_current().await?;
        let forecast = self.fetch_forecast().await;

        let imperial = self.settings.units == "imperial";
        let temp_unit = if imperial { "F" } else { "C" };
        let speed_unit = if imperial { "mph" } else { "m/s" };

        let mut frame = Frame::new(self.spec);
        let body_y = draw::header(&mut frame, &format!("Weather - {}", current.name));

        draw::text_centered(
            &mut frame,
            &format!("{:.0}{}", current.main.temp, temp_unit),
            body_y + 30,
            &draw::TITLE_FONT,
            palette::RED,
        );

        let description = current
            .weather
            .first()
            .map(|c| c.description.as_str())
            .unwrap_or("unknown");
        draw::text_centered(&mut frame, description, body_y + 60, &draw::BODY_FONT, palette::BLUE);

        let details_y = body_y + 95;
        let left_x = 60;
        let right_x = self.spec.width as i32 / 2 + 30;

        let left = [
            format!("Feels like: {:.0}{}", current.main.feels_like, temp_unit),
            format!("Humidity: {}%", current.main.humidity),
            format!("Pressure: {} hPa", current.main.pressure),
        ];
        let visibility = if imperial {
            format!("Visibility: {:.1} mi", current.visibility as f64 / 1000.0 * 0.621371)
        } else {
            format!("Visibility: {:.1} km", current.visibility as f64 / 1000.0)
        };
        let right = [
            format!("Wind: {:.0} {}", current.wind.speed, speed_unit),
            format!("Direction: {}", wind_direction(current.wind.deg)),
            visibility,
        ];
        for (i, line) in left.iter().enumerate() {
            draw::text_at(
                &mut frame,
                line,
                Point::new(left_x, details_y + i as i32 * 22),
                &draw::BODY_FONT,
                palette::BLACK,
            );
        }
        for (i, line) in right.iter().enumerate() {
            draw::text_at(
                &mut frame,
                line,
                Point::new(right_x, details_y + i as i32 * 22),
                &draw::BODY_FONT,
                palette::BLACK,
            );
        }

        if let Some(forecast) = forecast {
            let forecast_y = details_y + 90;
            draw::text_at(
                &mut frame,
                "Next 24 hours:",
                Point::new(40, forecast_y),
                &draw::EMPHASIS_FONT,
                palette::GREEN,
            );
            for (i, entry) in forecast.list.iter().take(4).enumerate() {
                let time = Local
                    .timestamp_opt(entry.dt, 0)
                    .single()
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| "--:--".to_string());
                let condition = entry.weather.first().map(|c| c.main.as_str()).unwrap_or("");
                draw::text_at(
                    &mut frame,
                    &format!("{}: {:.0}{}, {}", time, entry.main.temp, temp_unit, condition),
                    Point::new(55, forecast_y + 24 + i as i32 * 20),
                    &draw::SMALL_FONT,
                    palette::BLACK,
                );
            }
        }

        draw::footer(
            &mut frame,
            &format!("Updated: {}", Local::now().format("%H:%M")),
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ColorMode;

    #[test]
    fn wind_direction_covers_the_compass() {
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(90.0), "E");
        assert_eq!(wind_direction(180.0), "S");
        assert_eq!(wind_direction(270.0), "W");
        assert_eq!(wind_direction(359.0), "N");
        assert_eq!(wind_direction(22.5), "NNE");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let renderer = WeatherRenderer::new(
            FrameSpec {
                width: 100,
                height: 100,
                color_mode: ColorMode::SevenColor,
            },
            WeatherSettings::default(),
            String::new(),
        )
        .unwrap();

        let err = renderer.render().await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn parses_current_weather_payload() {
        let payload = r#"{
            "name": "Washington",
            "main": {"temp": 72.4, "feels_like": 74.0, "humidity": 55, "pressure": 1016},
            "weather": [{"main": "Clouds", "description": "scattered clouds"}],
            "wind": {"speed": 8.0, "deg": 200.0},
            "visibility": 10000
        }"#;
        let current: CurrentWeather = serde_json::from_str(payload).unwrap();
        assert_eq!(current.name, "Washington");
        assert_eq!(current.main.humidity, 55);
        assert_eq!(wind_direction(current.wind.deg), "SSW");
    }

    #[test]
    fn wind_defaults_when_absent() {
        let payload = r#"{
            "name": "X",
            "main": {"temp": 1.0, "feels_like": 1.0, "humidity": 1, "pressure": 1000},
            "weather": []
        }"#;
        let current: CurrentWeather = serde_json::from_str(payload).unwrap();
        assert_eq!(current.wind.speed, 0.0);
        assert_eq!(current.visibility, 0);
    }
}

//! Stock quotes from the Finnhub quote endpoint

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Local, Timelike};
use embedded_graphics::prelude::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::Renderer;
use crate::display::draw::{self, palette};
use crate::display::{Frame, FrameSpec};

const QUOTE_URL: &str = "https://finnhub.io/api/v1/quote";

/// Settings for the stock renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    pub symbols: Vec<String>,
    pub update_interval: u64,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            symbols: vec!["AAPL".to_string(), "GOOGL".to_string(), "MSFT".to_string()],
            update_interval: 1800,
        }
    }
}

/// Finnhub quote payload; single-letter fields are the API's own names
#[derive(Debug, Deserialize)]
struct QuotePayload {
    #[serde(rename = "c")]
    current: f64,
    #[serde(rename = "pc")]
    previous_close: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "o")]
    open: f64,
}

#[derive(Debug)]
struct Quote {
    symbol: String,
    current: f64,
    previous_close: f64,
    high: f64,
    low: f64,
    open: f64,
}

impl Quote {
    fn change(&self) -> f64 {
        self.current - self.previous_close
    }

    fn change_percent(&self) -> f64 {
        if self.previous_close > 0.0 {
            self.change() / self.previous_close * 100.0
        } else {
            0.0
        }
    }
}

/// Rough US market-hours check, weekdays 9 to 16 local. Holidays and the
/// half-open 9:30 minute are not modeled.
fn is_market_hours(weekday: chrono::Weekday, hour: u32) -> bool {
    !matches!(weekday, chrono::Weekday::Sat | chrono::Weekday::Sun) && (9..16).contains(&hour)
}

pub struct StockRenderer {
    spec: FrameSpec,
    settings: StockSettings,
    api_key: String,
    client: reqwest::Client,
}

impl StockRenderer {
    pub fn new(spec: FrameSpec, settings: StockSettings, api_key: String) -> Result<Self> {
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

    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        let mut quotes = Vec::new();
        for symbol in &self.settings.symbols {
            let response = self
                .client
                .get(QUOTE_URL)
                .query(&[("symbol", symbol.as_str()), ("token", self.api_key.as_str())])
                .send()
                .await
                .with_context(|| format!("quote request for {symbol} failed"))?
                .error_for_status()
                .with_context(|| format!("quote API rejected {symbol}"))?;
            let payload: QuotePayload = response
                .json()
                .await
                .with_context(|| format!("invalid quote response for {symbol}"))?;

            // Finnhub answers unknown symbols with zeroed fields.
            if payload.current > 0.0 {
                quotes.push(Quote {
                    symbol: symbol.clone(),
                    current: payload.current,
                    previous_close: payload.previous_close,
                    high: payload.high,
                    low: payload.low,
                    open: payload.open,
                });
            } else {
                warn!(symbol = symbol.as_str(), "no quote data for symbol");
            }
        }
        if quotes.is_empty() {
            bail!("no valid quote data received");
        }
        quotes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(quotes)
    }
}

#[async_trait]
impl Renderer for StockRenderer {
    fn name(&self) -> &str {
        "stock"
    }

    fn description(&self) -> &str {
        "Stock market quotes"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.update_interval)
    }

    async fn render(&self) -> Result<Frame> {
        if self.api_key.is_empty() {
            bail!("no Finnhub API key configured");
        }

        let quotes = self.fetch_quotes().await?;
        let now = Local::now();

        let mut frame = Frame::new(self.spec);
        let body_y = draw::header(&mut frame, "Stock Market");

        let open = is_market_hours(now.weekday(), now.hour());
        draw::text_centered(
            &mut frame,
            if open { "Market Open" } else { "Market Closed" },
            body_y + 16,
            &draw::EMPHASIS_FONT,
            if open { palette::GREEN } else { palette::RED },
        );

        let symbol_x = 60;
        let price_x = self.spec.width as i32 / 4 + 40;
        let change_x = self.spec.width as i32 / 2 + 20;
        let percent_x = self.spec.width as i32 * 3 / 4;
        let table_y = body_y + 50;

        for (label, x) in [
            ("Symbol", symbol_x),
            ("Price", price_x),
            ("Change", change_x),
            ("Change %", percent_x),
        ] {
            draw::text_at(
                &mut frame,
                label,
                Point::new(x, table_y),
                &draw::EMPHASIS_FONT,
                palette::BLACK,
            );
        }

        for (i, quote) in quotes.iter().take(8).enumerate() {
            let y = table_y + 28 + i as i32 * 26;
            let color = if quote.change() >= 0.0 {
                palette::GREEN
            } else {
                palette::RED
            };

            draw::text_at(
                &mut frame,
                &quote.symbol,
                Point::new(symbol_x, y),
                &draw::BODY_FONT,
                palette::BLACK,
            );
            draw::text_at(
                &mut frame,
                &format!("${:.2}", quote.current),
                Point::new(price_x, y),
                &draw::BODY_FONT,
                palette::BLACK,
            );
            draw::text_at(
                &mut frame,
                &format!("${:+.2}", quote.change()),
                Point::new(change_x, y),
                &draw::BODY_FONT,
                color,
            );
            draw::text_at(
                &mut frame,
                &format!("{:+.1}%", quote.change_percent()),
                Point::new(percent_x, y),
                &draw::BODY_FONT,
                color,
            );
        }

        if quotes.len() <= 5 {
            if let Some(first) = quotes.first() {
                let summary_y = table_y + 28 + quotes.len() as i32 * 26 + 20;
                draw::text_at(
                    &mut frame,
                    "Today's range:",
                    Point::new(40, summary_y),
                    &draw::EMPHASIS_FONT,
                    palette::BLUE,
                );
                draw::text_at(
                    &mut frame,
                    &format!("{}: ${:.2} - ${:.2}", first.symbol, first.low, first.high),
                    Point::new(40, summary_y + 22),
                    &draw::SMALL_FONT,
                    palette::BLACK,
                );
                draw::text_at(
                    &mut frame,
                    &format!("Open: ${:.2}, Previous: ${:.2}", first.open, first.previous_close),
                    Point::new(40, summary_y + 40),
                    &draw::SMALL_FONT,
                    palette::BLACK,
                );
            }
        }

        draw::footer(
            &mut frame,
            &format!("Updated: {} (data delayed)", now.format("%H:%M")),
        );
        Ok(frame)
    }
}

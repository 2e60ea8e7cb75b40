//! In-memory frame buffer handed from a renderer to the display arbiter

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Color capability of the target panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// ACeP-style seven-color panel (Inky Impression class)
    SevenColor,

    /// Grayscale panel
    Grayscale,

    /// Black/white only panel
    Monochrome,
}

/// Dimensions and color mode a renderer draws against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
}

/// One rendered image plus its color-mode tag.
///
/// Produced by a renderer, consumed exactly once by the display arbiter.
/// Drawing happens through the `embedded_graphics` `DrawTarget` impl;
/// out-of-bounds pixels are clipped.
#[derive(Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    color_mode: ColorMode,
    pixels: Vec<Rgb888>,
}

impl Frame {
    /// Create a frame filled with white (blank e-ink state)
    pub fn new(spec: FrameSpec) -> Self {
        Self {
            width: spec.width,
            height: spec.height,
            color_mode: spec.color_mode,
            pixels: vec![Rgb888::WHITE; (spec.width * spec.height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Convert to an `image` RGB buffer for PNG export or quantization
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.pixels[(y * self.width + x) as usize];
            image::Rgb([c.r(), c.g(), c.b()])
        })
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < self.width
                && (point.y as u32) < self.height
            {
                self.pixels[(point.y as u32 * self.width + point.x as u32) as usize] = color;
            }
        }
        Ok(())
    }
}

//! Shared drawing helpers used by the renderers and the test pattern

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_7X13, FONT_9X15_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Text};

use super::Frame;

/// Palette of the seven-color Inky class panels
pub mod palette {
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::RgbColor;

    pub const BLACK: Rgb888 = Rgb888::BLACK;
    pub const WHITE: Rgb888 = Rgb888::WHITE;
    pub const RED: Rgb888 = Rgb888::RED;
    pub const ORANGE: Rgb888 = Rgb888::new(255, 165, 0);
    pub const YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
    pub const GREEN: Rgb888 = Rgb888::GREEN;
    pub const BLUE: Rgb888 = Rgb888::BLUE;
}

pub const TITLE_FONT: MonoFont<'static> = FONT_10X20;
pub const BODY_FONT: MonoFont<'static> = FONT_7X13;
pub const EMPHASIS_FONT: MonoFont<'static> = FONT_9X15_BOLD;
pub const SMALL_FONT: MonoFont<'static> = FONT_6X10;

/// Draw text centered horizontally at the given baseline
pub fn text_centered(frame: &mut Frame, text: &str, y: i32, font: &MonoFont<'_>, color: Rgb888) {
    let style = MonoTextStyle::new(font, color);
    let x = frame.width() as i32 / 2;
    Text::with_alignment(text, Point::new(x, y), style, Alignment::Center)
        .draw(frame)
        .ok();
}

/// Draw left-aligned text at a point
pub fn text_at(frame: &mut Frame, text: &str, point: Point, font: &MonoFont<'_>, color: Rgb888) {
    let style = MonoTextStyle::new(font, color);
    Text::new(text, point, style).draw(frame).ok();
}

/// Centered title with a rule underneath; returns the y coordinate below the rule
pub fn header(frame: &mut Frame, title: &str) -> i32 {
    text_centered(frame, title, 36, &TITLE_FONT, palette::BLACK);

    let line_y = 50;
    let right = frame.width() as i32 - 50;
    Line::new(Point::new(50, line_y), Point::new(right, line_y))
        .into_styled(PrimitiveStyle::with_stroke(palette::BLACK, 2))
        .draw(frame)
        .ok();

    line_y + 24
}

/// Centered single line near the bottom edge
pub fn footer(frame: &mut Frame, text: &str) {
    let y = frame.height() as i32 - 16;
    text_centered(frame, text, y, &SMALL_FONT, palette::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{ColorMode, FrameSpec};

    #[test]
    fn header_marks_pixels_and_returns_body_origin() {
        let mut frame = Frame::new(FrameSpec {
            width: 200,
            height: 100,
            color_mode: ColorMode::SevenColor,
        });

        let body_y = header(&mut frame, "Test");
        assert!(body_y > 50);

        // The rule under the title must be drawn in black.
        assert_eq!(frame.pixel(60, 50), Some(palette::BLACK));
    }
}

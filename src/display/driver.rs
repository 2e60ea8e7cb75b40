//! Hardware driver seam and the file-backed fallback driver

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::info;

use super::draw::{self, palette};
use super::{Frame, FrameSpec};

/// Contract the arbiter drives a physical panel through.
///
/// A refresh either completes or fails as a whole; partial-refresh hazards
/// are the implementation's problem, not this contract's.
#[async_trait]
pub trait DisplayDriver: Send + Sync {
    /// Push one finished frame to the panel
    async fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Blank the panel
    async fn clear(&mut self) -> Result<()>;
}

/// Driver that saves every frame as a timestamped PNG.
///
/// Stands in for real panel hardware during development or on machines
/// without a panel attached. Frames are saved exactly as rendered; the
/// configured rotation is for panel drivers to apply at write time.
pub struct FileDriver {
    output_dir: PathBuf,
    spec: FrameSpec,
}

impl FileDriver {
    pub fn new(output_dir: PathBuf, spec: FrameSpec) -> Self {
        Self { output_dir, spec }
    }

    async fn save(&self, frame: &Frame, prefix: &str) -> Result<PathBuf> {
        let mut encoded = Vec::new();
        frame
            .to_image()
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .context("failed to encode frame as PNG")?;

        let name = format!("{}_{}.png", prefix, Local::now().format("%Y%m%d_%H%M%S%.3f"));
        let path = self.output_dir.join(name);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("failed to create output directory {:?}", self.output_dir))?;
        tokio::fs::write(&path, encoded)
            .await
            .with_context(|| format!("failed to write frame to {path:?}"))?;

        Ok(path)
    }
}

#[async_trait]
impl DisplayDriver for FileDriver {
    async fn write(&mut self, frame: &Frame) -> Result<()> {
        let path = self.save(frame, "frame").await?;
        info!("frame written to {:?}", path);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        let blank = Frame::new(self.spec);
        let path = self.save(&blank, "clear").await?;
        info!("display cleared, blank frame written to {:?}", path);
        Ok(())
    }
}

/// Build the sample frame used by the `test` command: title, resolution,
/// timestamp and one swatch per panel color.
pub fn test_pattern(spec: FrameSpec) -> Frame {
    let mut frame = Frame::new(spec);

    let body_y = draw::header(&mut frame, "einkd display test");
    draw::text_centered(
        &mut frame,
        &format!("Resolution: {}x{}", spec.width, spec.height),
        body_y + 20,
        &draw::BODY_FONT,
        palette::BLUE,
    );
    draw::text_centered(
        &mut frame,
        &Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        body_y + 44,
        &draw::BODY_FONT,
        palette::GREEN,
    );

    let swatches = [
        ("Black", palette::BLACK),
        ("Red", palette::RED),
        ("Orange", palette::ORANGE),
        ("Yellow", palette::YELLOW),
        ("Green", palette::GREEN),
        ("Blue", palette::BLUE),
    ];

    let top = body_y + 80;
    let step = (spec.width as i32 - 100) / swatches.len() as i32;
    for (i, (label, color)) in swatches.iter().enumerate() {
        let x = 50 + i as i32 * step;
        Rectangle::new(Point::new(x, top), Size::new(48, 48))
            .into_styled(PrimitiveStyle::with_fill(*color))
            .draw(&mut frame)
            .ok();
        draw::text_at(
            &mut frame,
            label,
            Point::new(x, top + 64),
            &draw::SMALL_FONT,
            palette::BLACK,
        );
    }

    draw::footer(&mut frame, "If you can read this, the refresh path works");
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ColorMode;
    use tempfile::TempDir;

    fn spec() -> FrameSpec {
        FrameSpec {
            width: 160,
            height: 120,
            color_mode: ColorMode::SevenColor,
        }
    }

    #[tokio::test]
    async fn file_driver_writes_png() {
        let dir = TempDir::new().unwrap();
        let mut driver = FileDriver::new(dir.path().to_path_buf(), spec());

        driver.write(&test_pattern(spec())).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("frame_"));
        assert!(entries[0].ends_with(".png"));
    }

    #[tokio::test]
    async fn file_driver_clear_writes_blank_frame() {
        let dir = TempDir::new().unwrap();
        let mut driver = FileDriver::new(dir.path().to_path_buf(), spec());

        driver.clear().await.unwrap();
        driver.clear().await.unwrap();

        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_pattern_draws_swatches() {
        let frame = test_pattern(spec());
        // Something other than the white background must be present.
        let mut non_white = 0;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.pixel(x, y) != Some(palette::WHITE) {
                    non_white += 1;
                }
            }
        }
        assert!(non_white > 100);
    }
}

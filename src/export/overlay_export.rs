use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::core::model::SectionBounds;
use crate::export::Exporter;
use crate::pipeline::ProcessedSheet;

pub const OVERLAY_FILE: &str = "overlay.png";

const BORDER_WIDTH: u32 = 3;

/// red, blue, green, orange, purple, brown, pink, gray
pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 0, 0]),
    Rgb([0, 0, 255]),
    Rgb([0, 128, 0]),
    Rgb([255, 165, 0]),
    Rgb([128, 0, 128]),
    Rgb([165, 42, 42]),
    Rgb([255, 192, 203]),
    Rgb([128, 128, 128]),
];

/// Draws a colored frame around every section on a copy of the sheet.
pub fn draw_sections(source: &RgbImage, bounds: &[SectionBounds]) -> RgbImage {
    let mut canvas = source.clone();

    for (i, b) in bounds.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        for inset in 0..BORDER_WIDTH {
            let (Some(width), Some(height)) = (
                b.width.checked_sub(2 * inset).filter(|w| *w > 0),
                b.height.checked_sub(2 * inset).filter(|h| *h > 0),
            ) else {
                break;
            };
            let rect = Rect::at((b.x + inset) as i32, (b.y + inset) as i32).of_size(width, height);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}

#[derive(Debug, Clone)]
pub struct OverlayExporter {
    out_dir: PathBuf,
}

impl OverlayExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for OverlayExporter {
    fn export(&self, sheet: &ProcessedSheet) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let overlay = draw_sections(&sheet.source.to_rgb8(), &sheet.bounds());
        let path = self.out_dir.join(OVERLAY_FILE);
        overlay
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

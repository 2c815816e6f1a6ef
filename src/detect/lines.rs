use image::GrayImage;
use tracing::debug;

use crate::core::error::SegmentError;
use crate::core::geometry::Band;
use crate::detect::morphology::open_horizontal;
use crate::detect::{bands_from_cuts, BoundaryDetector};

/// Finds ruled lines and borders: long, unbroken horizontal strokes.
#[derive(Debug, Clone)]
pub struct HorizontalLineDetector {
    pub kernel_width: u32,
    /// Share of the row width a stroke must cover, in `(0, 1]`.
    pub threshold: f32,
    /// Flagged rows at most this far apart belong to the same line.
    pub group_gap: u32,
    pub min_section_height: u32,
}

impl Default for HorizontalLineDetector {
    fn default() -> Self {
        Self {
            kernel_width: 40,
            threshold: 0.7,
            group_gap: 5,
            min_section_height: 50,
        }
    }
}

impl HorizontalLineDetector {
    /// Representative row of every detected line, top to bottom.
    pub fn line_positions(&self, gray: &GrayImage) -> Vec<u32> {
        let (width, _) = gray.dimensions();
        if width == 0 {
            return Vec::new();
        }

        let mut strokes = gray.clone();
        if has_light_background(gray) {
            image::imageops::invert(&mut strokes);
        }
        let opened = open_horizontal(&strokes, self.kernel_width);

        let limit = f64::from(width) * 255.0 * f64::from(self.threshold);
        let line_rows: Vec<u32> = opened
            .chunks_exact(width as usize)
            .enumerate()
            .filter(|(_, row)| row.iter().map(|&p| u64::from(p)).sum::<u64>() as f64 > limit)
            .map(|(y, _)| y as u32)
            .collect();

        group_rows(&line_rows, self.group_gap)
    }
}

impl BoundaryDetector for HorizontalLineDetector {
    fn name(&self) -> &'static str {
        "horizontal-lines"
    }

    fn detect(&self, gray: &GrayImage) -> Result<Vec<Band>, SegmentError> {
        let height = gray.height();
        let lines = self.line_positions(gray);
        if lines.is_empty() {
            debug!("no ruled lines found, keeping the whole sheet");
            return Ok(vec![Band::whole(height)]);
        }

        debug!(?lines, "ruled lines");
        Ok(bands_from_cuts(&lines, height, self.min_section_height))
    }
}

/// Paper is light when the mean intensity is above mid-gray; rules are then
/// the dark strokes.
fn has_light_background(gray: &GrayImage) -> bool {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return true;
    }
    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    sum / pixels.len() as u64 > 127
}

/// Collapses runs of rows separated by at most `gap` into their mean row.
fn group_rows(rows: &[u32], gap: u32) -> Vec<u32> {
    let mut grouped = Vec::new();
    let mut current: Vec<u32> = Vec::new();

    for &row in rows {
        if let Some(&last) = current.last() {
            if row - last > gap {
                grouped.push(mean_row(&current));
                current.clear();
            }
        }
        current.push(row);
    }
    if !current.is_empty() {
        grouped.push(mean_row(&current));
    }

    grouped
}

fn mean_row(rows: &[u32]) -> u32 {
    let sum: u64 = rows.iter().map(|&r| u64::from(r)).sum();
    (sum / rows.len() as u64) as u32
}

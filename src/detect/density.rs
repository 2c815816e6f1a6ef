use image::GrayImage;
use imageproc::edges::canny;
use tracing::debug;

use crate::core::error::SegmentError;
use crate::core::geometry::Band;
use crate::detect::{bands_from_cuts, BoundaryDetector};

/// Cuts where the amount of writing per row changes abruptly.
///
/// The change threshold is a multiple of the standard deviation of the
/// row-to-row density deltas, so it adapts to how dense each scan is.
#[derive(Debug, Clone)]
pub struct TextDensityDetector {
    pub canny_low: f32,
    pub canny_high: f32,
    pub sigma_factor: f64,
    pub min_section_height: u32,
}

impl Default for TextDensityDetector {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            sigma_factor: 2.0,
            min_section_height: 50,
        }
    }
}

impl TextDensityDetector {
    /// Edge pixels per row divided by the row width.
    pub fn row_density(&self, gray: &GrayImage) -> Vec<f64> {
        let width = gray.width() as usize;
        if width == 0 {
            return Vec::new();
        }
        let edges = canny(gray, self.canny_low, self.canny_high);
        edges
            .chunks_exact(width)
            .map(|row| row.iter().filter(|&&p| p > 0).count() as f64 / width as f64)
            .collect()
    }

    pub fn change_points(&self, density: &[f64]) -> Vec<u32> {
        let deltas: Vec<f64> = density.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let threshold = std_dev(&deltas) * self.sigma_factor;
        deltas
            .iter()
            .enumerate()
            .filter(|(_, delta)| delta.abs() > threshold)
            .map(|(idx, _)| idx as u32)
            .collect()
    }
}

impl BoundaryDetector for TextDensityDetector {
    fn name(&self) -> &'static str {
        "text-density"
    }

    fn detect(&self, gray: &GrayImage) -> Result<Vec<Band>, SegmentError> {
        let height = gray.height();
        let points = self.change_points(&self.row_density(gray));
        if points.is_empty() {
            debug!("no density change points, keeping the whole sheet");
            return Ok(vec![Band::whole(height)]);
        }

        debug!(count = points.len(), "density change points");
        Ok(bands_from_cuts(&points, height, self.min_section_height))
    }
}

/// Population standard deviation; zero for an empty series.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[0.3, 0.3, 0.3]), 0.0);
        assert!((std_dev(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn change_points_use_adaptive_threshold() {
        let detector = TextDensityDetector::default();
        let mut density = vec![0.0; 20];
        for value in density.iter_mut().skip(10) {
            *value = 0.4;
        }
        // the only non-zero delta sits between rows 9 and 10
        assert_eq!(detector.change_points(&density), vec![9]);
    }

    #[test]
    fn uniform_sheet_is_one_band() {
        let image = GrayImage::from_pixel(200, 300, Luma([240]));
        let bands = TextDensityDetector::default()
            .detect(&image)
            .expect("detection");
        assert_eq!(bands, vec![Band::whole(300)]);
    }

    #[test]
    fn single_row_sheet_is_one_band() {
        let image = GrayImage::from_pixel(50, 1, Luma([0]));
        let bands = TextDensityDetector::default()
            .detect(&image)
            .expect("detection");
        assert_eq!(bands, vec![Band::whole(1)]);
    }

    #[test]
    fn splits_around_dense_block() {
        // vertical stripes between rows 150 and 250 stand in for handwriting
        let image = GrayImage::from_fn(200, 400, |x, y| {
            if (150..250).contains(&y) && (x / 4) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });

        let bands = TextDensityDetector::default()
            .detect(&image)
            .expect("detection");
        assert_eq!(bands.len(), 3, "bands: {bands:?}");
        assert!((140..=160).contains(&bands[0].end), "bands: {bands:?}");
        assert!((240..=260).contains(&bands[1].end), "bands: {bands:?}");
        assert_eq!(bands[2].end, 400);
    }
}

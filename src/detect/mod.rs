//! Boundary detectors.
//!
//! Each detector looks at the grayscale sheet independently and proposes a
//! list of horizontal bands. The fusion stage reconciles the proposals.

pub mod density;
pub mod lines;
pub mod morphology;

pub use density::TextDensityDetector;
pub use lines::HorizontalLineDetector;

use image::GrayImage;

use crate::core::error::SegmentError;
use crate::core::geometry::Band;

pub trait BoundaryDetector {
    fn name(&self) -> &'static str;

    fn detect(&self, gray: &GrayImage) -> Result<Vec<Band>, SegmentError>;
}

/// Walks sorted cut rows top to bottom and emits `[cut, next_cut)` whenever the
/// gap exceeds `min_height`, then closes the trailing band at `height`.
pub fn bands_from_cuts(cuts: &[u32], height: u32, min_height: u32) -> Vec<Band> {
    let mut bands = Vec::new();
    let mut start = 0u32;

    for &cut in cuts {
        if cut > start && cut - start > min_height {
            bands.push(Band::new(start, cut));
            start = cut;
        }
    }

    if height > start && height - start > min_height {
        bands.push(Band::new(start, height));
    }

    bands
}

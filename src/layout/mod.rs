//! Layout analysis: detectors, fusion and the fallback policy.

pub mod extract;

pub use extract::extract_sections;

use image::GrayImage;
use tracing::{debug, info, warn};

use crate::config::SegmentationConfig;
use crate::core::confidence::BoundsOrigin;
use crate::core::error::SegmentError;
use crate::core::geometry::Band;
use crate::core::model::SectionBounds;
use crate::core::raster::SheetImage;
use crate::detect::{BoundaryDetector, HorizontalLineDetector, TextDensityDetector};
use crate::fusion::finalize::{fallback_bounds, to_bounds, FALLBACK_SECTION_COUNT};
use crate::fusion::{FusionEngine, Proposal, SimpleFusionEngine};

/// Turns a sheet into full-width section bounds.
///
/// Detectors run in registration order, which is also their priority when
/// the fusion engine has to pick between nearby cuts.
pub struct LayoutAnalyzer {
    detectors: Vec<Box<dyn BoundaryDetector>>,
    fusion: Box<dyn FusionEngine>,
    fallback_sections: u32,
}

impl Default for LayoutAnalyzer {
    fn default() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }
}

impl LayoutAnalyzer {
    pub fn new(detectors: Vec<Box<dyn BoundaryDetector>>, fusion: Box<dyn FusionEngine>) -> Self {
        Self {
            detectors,
            fusion,
            fallback_sections: FALLBACK_SECTION_COUNT,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        let lines = HorizontalLineDetector {
            kernel_width: config.line_kernel_width,
            threshold: config.line_threshold as f32,
            group_gap: config.line_group_gap,
            min_section_height: config.min_section_height,
        };
        let density = TextDensityDetector {
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            sigma_factor: config.density_sigma,
            min_section_height: config.min_section_height,
        };
        let fusion = SimpleFusionEngine::new(config.min_section_height, config.snap_tolerance);

        Self {
            detectors: vec![Box::new(lines), Box::new(density)],
            fusion: Box::new(fusion),
            fallback_sections: config.fallback_sections,
        }
    }

    /// Never fails: an image that cannot be analyzed is split into equal
    /// bands with fallback confidence.
    pub fn analyze(&self, image: &SheetImage) -> Vec<SectionBounds> {
        match self.try_analyze(image) {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!(error = %err, "layout analysis failed, splitting the sheet evenly");
                fallback_bounds(image.width(), image.height(), self.fallback_sections)
            }
        }
    }

    pub fn try_analyze(&self, image: &SheetImage) -> Result<Vec<SectionBounds>, SegmentError> {
        let gray = image.to_gray()?;
        let bands = self.detect_bands(&gray)?;
        info!(sections = bands.len(), "layout analysis complete");
        Ok(to_bounds(&bands, gray.width(), BoundsOrigin::Heuristic))
    }

    fn detect_bands(&self, gray: &GrayImage) -> Result<Vec<Band>, SegmentError> {
        let mut proposals = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let bands = detector.detect(gray)?;
            debug!(detector = detector.name(), ?bands, "detector proposal");
            proposals.push(Proposal {
                detector: detector.name(),
                bands,
            });
        }
        Ok(self.fusion.fuse(&proposals, gray.height()))
    }
}

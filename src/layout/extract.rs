use image::{DynamicImage, GenericImageView};

use crate::core::error::SegmentError;
use crate::core::model::SectionBounds;

/// Crops one sub-image per bounds entry, in order.
pub fn extract_sections(
    image: &DynamicImage,
    bounds: &[SectionBounds],
) -> Result<Vec<DynamicImage>, SegmentError> {
    let (image_width, image_height) = image.dimensions();

    bounds
        .iter()
        .enumerate()
        .map(|(index, b)| {
            if !b.fits_within(image_width, image_height) {
                return Err(SegmentError::InvalidBounds {
                    index,
                    x: b.x,
                    y: b.y,
                    width: b.width,
                    height: b.height,
                    image_width,
                    image_height,
                });
            }
            Ok(image.crop_imm(b.x, b.y, b.width, b.height))
        })
        .collect()
}

use crate::core::confidence::BoundsOrigin;
use crate::core::geometry::{equal_bands, Band};
use crate::core::model::SectionBounds;

/// Number of stacked blocks on a standard proposal sheet.
pub const FALLBACK_SECTION_COUNT: u32 = 4;

/// Bands between consecutive cut rows, keeping those taller than `min_height`.
pub fn bands_between(cuts: &[u32], min_height: u32) -> Vec<Band> {
    cuts.windows(2)
        .filter(|pair| pair[1] > pair[0] && pair[1] - pair[0] > min_height)
        .map(|pair| Band::new(pair[0], pair[1]))
        .collect()
}

pub fn to_bounds(bands: &[Band], image_width: u32, origin: BoundsOrigin) -> Vec<SectionBounds> {
    bands
        .iter()
        .map(|band| SectionBounds::from_band(*band, image_width, origin.confidence()))
        .collect()
}

/// Blind split used when layout analysis could not run at all.
pub fn fallback_bounds(image_width: u32, image_height: u32, count: u32) -> Vec<SectionBounds> {
    to_bounds(
        &equal_bands(image_height, count),
        image_width,
        BoundsOrigin::Fallback,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drops_micro_bands() {
        assert_eq!(
            bands_between(&[0, 400, 403, 900, 1600], 50),
            vec![Band::new(0, 400), Band::new(403, 900), Band::new(900, 1600)]
        );
    }

    #[test]
    fn quartering_covers_the_sheet() {
        let bounds = fallback_bounds(1200, 1601, FALLBACK_SECTION_COUNT);
        assert_eq!(bounds.len(), 4);
        assert_eq!(bounds.iter().map(|b| b.height).sum::<u32>(), 1601);
        assert_eq!(bounds[3].height, 401);
        for b in &bounds {
            assert_eq!(b.width, 1200);
            assert_eq!(b.x, 0);
            assert_eq!(b.confidence, 0.5);
        }
    }
}

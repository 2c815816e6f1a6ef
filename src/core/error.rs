use thiserror::Error;

/// Failures inside the segmentation core.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("raster holds {actual} bytes, expected {expected} for a {width}x{height} image")]
    CorruptRaster {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error(
        "section {index} bounds (x={x}, y={y}, {width}x{height}) fall outside the {image_width}x{image_height} image"
    )]
    InvalidBounds {
        index: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageReader, Luma, Rgb, Rgba};

use crate::core::error::SegmentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Luma,
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Luma => 1,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Scanned sheet as declared geometry plus raw pixel bytes.
///
/// The buffer is not validated on construction. Conversions check it, so a
/// truncated scan still reports its declared size and can be divided blindly.
#[derive(Debug, Clone)]
pub struct SheetImage {
    width: u32,
    height: u32,
    layout: PixelLayout,
    pixels: Vec<u8>,
}

impl SheetImage {
    pub fn from_raw(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_raw(
                gray.width(),
                gray.height(),
                PixelLayout::Luma,
                gray.as_raw().clone(),
            ),
            DynamicImage::ImageRgba8(rgba) => Self::from_raw(
                rgba.width(),
                rgba.height(),
                PixelLayout::Rgba,
                rgba.as_raw().clone(),
            ),
            other => {
                let rgb = other.to_rgb8();
                Self::from_raw(rgb.width(), rgb.height(), PixelLayout::Rgb, rgb.into_raw())
            }
        }
    }

    pub fn open(path: &Path) -> Result<Self, SegmentError> {
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(SegmentError::Decode)?;
        Ok(Self::from_dynamic(&decoded))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage, SegmentError> {
        if self.width == 0 || self.height == 0 {
            return Err(SegmentError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.width as usize * self.height as usize * self.layout.channels();
        let corrupt = || SegmentError::CorruptRaster {
            width: self.width,
            height: self.height,
            expected,
            actual: self.pixels.len(),
        };
        if self.pixels.len() != expected {
            return Err(corrupt());
        }

        let pixels = self.pixels.clone();
        let image = match self.layout {
            PixelLayout::Luma => {
                ImageBuffer::<Luma<u8>, _>::from_raw(self.width, self.height, pixels)
                    .map(DynamicImage::ImageLuma8)
            }
            PixelLayout::Rgb => ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, pixels)
                .map(DynamicImage::ImageRgb8),
            PixelLayout::Rgba => {
                ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, pixels)
                    .map(DynamicImage::ImageRgba8)
            }
        };
        image.ok_or_else(corrupt)
    }

    pub fn to_gray(&self) -> Result<GrayImage, SegmentError> {
        Ok(self.to_dynamic()?.to_luma8())
    }
}

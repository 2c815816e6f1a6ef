use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_open, Mask};

/// Widest element `Mask::from_image` accepts.
pub const MAX_KERNEL_WIDTH: u32 = 511;

/// `width`×1 structuring element anchored at its middle column.
pub fn horizontal_element(width: u32) -> Mask {
    let width = width.clamp(1, MAX_KERNEL_WIDTH);
    let element = GrayImage::from_pixel(width, 1, Luma([255]));
    Mask::from_image(&element, (width / 2) as u8, 0)
}

/// Morphological opening with a `kernel_width`×1 rectangle.
///
/// Bright horizontal runs shorter than the kernel are flattened to the
/// darkest value around them; longer runs survive unchanged.
pub fn open_horizontal(image: &GrayImage, kernel_width: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || kernel_width <= 1 {
        return image.clone();
    }
    grayscale_open(image, &horizontal_element(kernel_width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row_sum(image: &GrayImage, y: u32) -> u32 {
        (0..image.width()).map(|x| u32::from(image.get_pixel(x, y).0[0])).sum()
    }

    #[test]
    fn opening_removes_short_runs() {
        let mut image = GrayImage::new(100, 3);
        // long run on row 0, short run on row 2
        for x in 10..90 {
            image.put_pixel(x, 0, Luma([255]));
        }
        for x in 40..50 {
            image.put_pixel(x, 2, Luma([255]));
        }

        let opened = open_horizontal(&image, 40);
        assert_eq!(row_sum(&opened, 0), 80 * 255);
        assert_eq!(row_sum(&opened, 2), 0);
    }

    #[test]
    fn vertical_strokes_do_not_survive() {
        let mut image = GrayImage::new(60, 60);
        for y in 0..60 {
            for x in 28..31 {
                image.put_pixel(x, y, Luma([255]));
            }
        }
        let opened = open_horizontal(&image, 40);
        assert!(opened.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn opening_never_brightens() {
        let image = GrayImage::from_fn(64, 4, |x, y| Luma([((x * 37 + y * 11) % 256) as u8]));
        let opened = open_horizontal(&image, 7);
        for (a, b) in opened.pixels().zip(image.pixels()) {
            assert!(a.0[0] <= b.0[0]);
        }
    }

    #[test]
    fn oversized_kernel_is_clamped() {
        let image = GrayImage::from_pixel(600, 2, Luma([200]));
        let opened = open_horizontal(&image, 2000);
        assert_eq!(opened, image);
    }
}

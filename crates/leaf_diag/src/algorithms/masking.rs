use image::{GrayImage, Luma};
use crate::types::{HsvImage, HsvRange};

pub const FOREGROUND: u8 = 255;

/// Binary mask of the pixels whose HSV triple lies inside `range`,
/// 255 where it does and 0 elsewhere.
pub fn in_range(hsv: &HsvImage, range: &HsvRange) -> GrayImage {
    let mut mask = GrayImage::new(hsv.width(), hsv.height());

    for (src, dst) in hsv.buffer().pixels().zip(mask.pixels_mut()) {
        if range.contains(src.0) {
            *dst = Luma([FOREGROUND]);
        }
    }

    mask
}

/// Exact number of non-zero cells.
pub fn count_non_zero(mask: &GrayImage) -> u64 {
    mask.as_raw().iter().filter(|&&value| value != 0).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsv_image(pixels: &[[u8; 3]]) -> HsvImage {
        let mut image = HsvImage::new(pixels.len() as u32, 1);
        for (x, &hsv) in pixels.iter().enumerate() {
            image.put(x as u32, 0, hsv);
        }
        image
    }

    #[test]
    fn test_masks_are_independent() {
        let image = hsv_image(&[
            [60, 200, 200],  // leaf
            [20, 150, 150],  // lesion
            [27, 99, 100],   // both
            [0, 0, 255],     // neither
            [120, 255, 255], // neither
        ]);

        let leaf = in_range(&image, &HsvRange::LEAF);
        let lesion = in_range(&image, &HsvRange::LESION);

        assert_eq!(leaf.as_raw(), &vec![255, 0, 255, 0, 0]);
        assert_eq!(lesion.as_raw(), &vec![0, 255, 255, 0, 0]);
        assert_eq!(count_non_zero(&leaf), 2);
        assert_eq!(count_non_zero(&lesion), 2);
    }

    #[test]
    fn test_mask_matches_source_dimensions() {
        let image = HsvImage::new(7, 5);
        let mask = in_range(&image, &HsvRange::LEAF);
        assert_eq!(mask.dimensions(), (7, 5));
        assert_eq!(count_non_zero(&mask), 0);
    }
}

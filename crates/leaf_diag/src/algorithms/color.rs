use std::sync::Arc;

use image::RgbImage;
use crate::{error::Result, traits::ColorSpaceConverter, types::HsvImage};

const HSV_SHIFT: u32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);
const HUE_RANGE: i32 = 180;

/// Fixed-point reciprocal tables for 8-bit RGB to HSV conversion.
///
/// `sdiv[v] ≈ (255 << 12) / v` and `hdiv[d] ≈ (180 << 12) / (6 d)`, both
/// zero at index 0, so that saturation and hue reduce to one multiply and
/// one shift per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsvTables {
    sdiv: [i32; 256],
    hdiv: [i32; 256],
}

impl HsvTables {
    pub fn build() -> Self {
        let mut sdiv = [0i32; 256];
        let mut hdiv = [0i32; 256];

        for i in 1..256 {
            let divisor = i as f64;
            sdiv[i] = ((255 << HSV_SHIFT) as f64 / divisor).round_ties_even() as i32;
            hdiv[i] = ((HUE_RANGE << HSV_SHIFT) as f64 / (6.0 * divisor)).round_ties_even() as i32;
        }

        Self { sdiv, hdiv }
    }

    /// Convert one `[r, g, b]` pixel to `[h, s, v]`.
    #[inline]
    pub fn rgb_to_hsv(&self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        let (r, g, b) = (r as i32, g as i32, b as i32);

        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = (diff * self.sdiv[v as usize] + HSV_ROUND) >> HSV_SHIFT;

        let sector = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let mut h = (sector * self.hdiv[diff as usize] + HSV_ROUND) >> HSV_SHIFT;
        if h < 0 {
            h += HUE_RANGE;
        }

        [h as u8, s as u8, v as u8]
    }
}

impl Default for HsvTables {
    fn default() -> Self {
        Self::build()
    }
}

/// Table-driven converter producing hue in 0..180 and saturation/value in 0..=255
#[derive(Debug, Clone)]
pub struct TableHsvConverter {
    tables: Arc<HsvTables>,
}

impl TableHsvConverter {
    pub fn new(tables: Arc<HsvTables>) -> Self {
        Self { tables }
    }
}

impl ColorSpaceConverter for TableHsvConverter {
    fn convert(&self, image: &RgbImage) -> Result<HsvImage> {
        let mut hsv = HsvImage::new(image.width(), image.height());

        for (src, dst) in image.pixels().zip(hsv.buffer_mut().pixels_mut()) {
            dst.0 = self.tables.rgb_to_hsv(src.0);
        }

        Ok(hsv)
    }
}

use image::{GrayImage, RgbImage};
use crate::{error::Result, types::HsvImage};

/// Trait for RGB to 8-bit HSV conversion
pub trait ColorSpaceConverter: Send + Sync {
    /// Convert every pixel of an alpha-free image
    fn convert(&self, image: &RgbImage) -> Result<HsvImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract the outer boundaries of the foreground regions of a binary mask
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Vec<[f32; 2]>>>;
}

/// Trait for boundary compression algorithms
pub trait ContourApproximation: Send + Sync {
    /// Reduce a closed boundary to the points that matter for drawing
    fn approximate(&self, contour: &[[f32; 2]]) -> Vec<[f32; 2]>;
}

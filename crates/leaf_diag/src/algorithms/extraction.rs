use image::GrayImage;
use imageproc::contours::BorderType;
use crate::{error::Result, traits::{ContourApproximation, ContourExtractor}};

/// Imageproc-based extractor keeping only the outermost borders.
///
/// Holes, and regions nested inside holes, are dropped.
#[derive(Debug, Clone, Default)]
pub struct ExternalContourExtractor;

impl ContourExtractor for ExternalContourExtractor {
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Vec<[f32; 2]>>> {
        let contours = imageproc::contours::find_contours::<i32>(mask);

        let result = contours
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
            .map(|contour| {
                contour.points
                    .iter()
                    .map(|p| [p.x as f32, p.y as f32])
                    .collect()
            })
            .collect();

        Ok(result)
    }
}

/// Keeps only the vertices where the boundary changes direction.
#[derive(Debug, Clone, Default)]
pub struct ChainApproximation;

impl ContourApproximation for ChainApproximation {
    fn approximate(&self, contour: &[[f32; 2]]) -> Vec<[f32; 2]> {
        let n = contour.len();
        if n <= 2 {
            return contour.to_vec();
        }

        let step = |from: [f32; 2], to: [f32; 2]| {
            [
                (to[0] as i32 - from[0] as i32).signum(),
                (to[1] as i32 - from[1] as i32).signum(),
            ]
        };

        let corners: Vec<[f32; 2]> = (0..n)
            .filter(|&i| {
                let prev = contour[(i + n - 1) % n];
                let here = contour[i];
                let next = contour[(i + 1) % n];
                step(prev, here) != step(here, next)
            })
            .map(|i| contour[i])
            .collect();

        if corners.is_empty() {
            contour[..1].to_vec()
        } else {
            corners
        }
    }
}

/// Leaves every boundary point in place
#[derive(Debug, Clone, Default)]
pub struct NoApproximation;

impl ContourApproximation for NoApproximation {
    fn approximate(&self, contour: &[[f32; 2]]) -> Vec<[f32; 2]> {
        contour.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) {
        for y in ys {
            for x in xs.clone() {
                mask.put_pixel(x, y, Luma([255u8]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = GrayImage::new(16, 16);
        let contours = ExternalContourExtractor.extract_contours(&mask).expect("Should extract");
        assert!(contours.is_empty());
    }

    #[test]
    fn test_one_contour_per_region() {
        let mut mask = GrayImage::new(40, 20);
        fill(&mut mask, 2..8, 2..8);
        fill(&mut mask, 20..30, 5..15);

        let contours = ExternalContourExtractor.extract_contours(&mask).expect("Should extract");
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn test_holes_and_nested_regions_are_ignored() {
        let mut mask = GrayImage::new(30, 30);
        fill(&mut mask, 2..28, 2..28);
        // punch a hole with an island inside it
        for y in 8..22 {
            for x in 8..22 {
                mask.put_pixel(x, y, Luma([0u8]));
            }
        }
        fill(&mut mask, 12..18, 12..18);

        let contours = ExternalContourExtractor.extract_contours(&mask).expect("Should extract");
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn test_rectangle_compresses_to_corners() {
        let mut mask = GrayImage::new(20, 20);
        fill(&mut mask, 3..8, 4..8);

        let contours = ExternalContourExtractor.extract_contours(&mask).expect("Should extract");
        assert_eq!(contours.len(), 1);

        let corners = ChainApproximation.approximate(&contours[0]);
        assert_eq!(corners.len(), 4);
        for corner in [[3.0, 4.0], [7.0, 4.0], [7.0, 7.0], [3.0, 7.0]] {
            assert!(corners.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn test_degenerate_contours_pass_through() {
        assert_eq!(ChainApproximation.approximate(&[[1.0, 1.0]]), vec![[1.0, 1.0]]);
        assert!(ChainApproximation.approximate(&[]).is_empty());
    }

    #[test]
    fn test_no_approximation_keeps_points() {
        let contour = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [2.0, 1.0]];
        assert_eq!(NoApproximation.approximate(&contour), contour);
    }
}

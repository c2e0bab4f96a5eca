use geo_types::{Coord, LineString, Polygon};
use image::{ImageBuffer, Rgb, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classification::SeverityBand;

/// An image whose three channels hold hue (0-179), saturation and value.
#[derive(Debug, Clone, PartialEq)]
pub struct HsvImage(ImageBuffer<Rgb<u8>, Vec<u8>>);

impl HsvImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self(ImageBuffer::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// `[h, s, v]` at the given position.
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.0.get_pixel(x, y).0
    }

    pub fn put(&mut self, x: u32, y: u32, hsv: [u8; 3]) {
        self.0.put_pixel(x, y, Rgb(hsv));
    }

    pub fn buffer(&self) -> &ImageBuffer<Rgb<u8>, Vec<u8>> {
        &self.0
    }

    pub fn buffer_mut(&mut self) -> &mut ImageBuffer<Rgb<u8>, Vec<u8>> {
        &mut self.0
    }
}

/// Inclusive lower/upper bounds on the three HSV channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HsvRange {
    /// `[h, s, v]` lower bound
    pub lower: [u8; 3],
    /// `[h, s, v]` upper bound
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Green tissue.
    pub const LEAF: Self = Self::new([25, 40, 40], [90, 255, 255]);

    /// Brown, necrotic tissue.
    pub const LESION: Self = Self::new([10, 50, 50], [30, 255, 255]);

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

/// Closed outline of one connected lesion region, corners only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LesionContour {
    pub points: Vec<[f32; 2]>,
}

impl LesionContour {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Convert to a geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f32> {
        let coords: Vec<Coord<f32>> = self.points
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Area enclosed by the outline (not the pixel count of the region).
    pub fn area(&self) -> f32 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    pub fn bounding_box(&self) -> ([f32; 2], [f32; 2]) {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];

        for &[x, y] in &self.points {
            min = [min[0].min(x), min[1].min(y)];
            max = [max[0].max(x), max[1].max(y)];
        }

        (min, max)
    }

    /// Length of the closed outline.
    pub fn perimeter(&self) -> f32 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points
            .iter()
            .zip(self.points.iter().cycle().skip(1))
            .map(|(a, b)| {
                let dx = b[0] - a[0];
                let dy = b[1] - a[1];
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }
}

pub type ContourSet = Vec<LesionContour>;

/// Output of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Copy of the input with lesion outlines drawn on it
    pub annotated: RgbaImage,
    pub leaf_area: u64,
    pub lesion_area: u64,
    /// Full precision, not clamped to 100
    pub severity_ratio: f64,
    pub band: SeverityBand,
    pub diagnosis: String,
    pub contours: ContourSet,
}

impl AnalysisResult {
    pub fn assemble(
        annotated: RgbaImage,
        leaf_area: u64,
        lesion_area: u64,
        severity_ratio: f64,
        contours: ContourSet,
    ) -> Self {
        let band = SeverityBand::classify(severity_ratio);
        Self {
            annotated,
            leaf_area,
            lesion_area,
            severity_ratio,
            band,
            diagnosis: band.diagnosis(),
            contours,
        }
    }

    /// Severity percentage rounded to one decimal, e.g. `"20.0"`.
    pub fn severity_display(&self) -> String {
        format!("{:.1}", self.severity_ratio)
    }

    pub fn summary(&self) -> AnalysisSummary {
        let largest_lesion_outline_area = self.contours
            .iter()
            .map(LesionContour::area)
            .fold(0.0_f32, f32::max);

        AnalysisSummary {
            image_width: self.annotated.width(),
            image_height: self.annotated.height(),
            leaf_area: self.leaf_area,
            lesion_area: self.lesion_area,
            severity_ratio: self.severity_ratio,
            severity_percent: (self.severity_ratio * 10.0).round() / 10.0,
            band: self.band,
            label: self.band.label().to_string(),
            advisory: self.band.advisory().to_string(),
            lesion_regions: self.contours.len(),
            largest_lesion_outline_area,
        }
    }
}

/// Pixel-free view of an [`AnalysisResult`], suitable for JSON reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSummary {
    pub image_width: u32,
    pub image_height: u32,
    pub leaf_area: u64,
    pub lesion_area: u64,
    pub severity_ratio: f64,
    /// Severity rounded to one decimal place
    pub severity_percent: f64,
    pub band: SeverityBand,
    pub label: String,
    pub advisory: String,
    pub lesion_regions: usize,
    pub largest_lesion_outline_area: f32,
}

impl AnalysisSummary {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

use std::sync::Arc;

use crate::{
    algorithms::{ChainApproximation, ExternalContourExtractor, NoApproximation},
    config::{AnalysisConfig, OverlayStyle},
    error::Result,
    pipeline::LeafAnalyzer,
    runtime::VisionRuntime,
    traits::{ColorSpaceConverter, ContourApproximation, ContourExtractor},
    types::HsvRange,
};

/// Builder for [`LeafAnalyzer`] with a fluent API
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
    color_converter: Option<Box<dyn ColorSpaceConverter>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    approximation: Option<Box<dyn ContourApproximation>>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            color_converter: None,
            contour_extractor: None,
            approximation: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn leaf_range(mut self, range: HsvRange) -> Self {
        self.config.leaf_range = range;
        self
    }

    pub fn lesion_range(mut self, range: HsvRange) -> Self {
        self.config.lesion_range = range;
        self
    }

    pub fn overlay(mut self, overlay: OverlayStyle) -> Self {
        self.config.overlay = overlay;
        self
    }

    /// Use a custom converter instead of the backend's table converter
    pub fn set_color_converter<C>(mut self, converter: C) -> Self
    where
        C: ColorSpaceConverter + 'static,
    {
        self.color_converter = Some(Box::new(converter));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the boundary compression (replaces any existing one)
    pub fn set_approximation<A>(mut self, approximation: A) -> Self
    where
        A: ContourApproximation + 'static,
    {
        self.approximation = Some(Box::new(approximation));
        self
    }

    /// Keep every boundary pixel in the outlines
    pub fn without_approximation(self) -> Self {
        self.set_approximation(NoApproximation)
    }

    /// Build the analyzer with default components where none were given
    pub fn build(self, runtime: Arc<VisionRuntime>) -> LeafAnalyzer {
        let contour_extractor = self.contour_extractor
            .unwrap_or_else(|| Box::new(ExternalContourExtractor));

        let approximation = self.approximation
            .unwrap_or_else(|| Box::new(ChainApproximation));

        LeafAnalyzer::new(
            runtime,
            self.config,
            self.color_converter,
            contour_extractor,
            approximation,
        )
    }

    /// Like [`Self::build`], but reject an invalid configuration first
    pub fn try_build(self, runtime: Arc<VisionRuntime>) -> Result<LeafAnalyzer> {
        self.config.validate()?;
        Ok(self.build(runtime))
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeafDiagError;

    #[test]
    fn test_defaults() {
        let analyzer = AnalyzerBuilder::new().build(Arc::new(VisionRuntime::new()));
        assert_eq!(analyzer.config(), &AnalysisConfig::default());
        assert!(!analyzer.is_ready());
    }

    #[test]
    fn test_overrides_apply() {
        let analyzer = AnalyzerBuilder::new()
            .leaf_range(HsvRange::new([30, 60, 60], [80, 255, 255]))
            .overlay(OverlayStyle { stroke_width: 5, color: [0, 0, 255, 255] })
            .build(Arc::new(VisionRuntime::new()));

        assert_eq!(analyzer.config().leaf_range.lower, [30, 60, 60]);
        assert_eq!(analyzer.config().lesion_range, HsvRange::LESION);
        assert_eq!(analyzer.config().overlay.stroke_width, 5);
    }

    #[test]
    fn test_try_build_validates() {
        let result = AnalyzerBuilder::new()
            .lesion_range(HsvRange::new([40, 0, 0], [10, 255, 255]))
            .try_build(Arc::new(VisionRuntime::new()));
        assert!(matches!(result, Err(LeafDiagError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_without_approximation_keeps_boundary_pixels() {
        let runtime = VisionRuntime::load_default().await.expect("Should load backend");
        let analyzer = AnalyzerBuilder::new().without_approximation().build(runtime);

        let mut image = image::RgbImage::new(20, 20);
        for y in 4..8 {
            for x in 4..9 {
                image.put_pixel(x, y, image::Rgb([150, 121, 62]));
            }
        }
        let result = analyzer
            .analyze(&image::DynamicImage::ImageRgb8(image))
            .expect("Should analyze");

        assert_eq!(result.contours.len(), 1);
        assert!(result.contours[0].len() > 4);
    }
}

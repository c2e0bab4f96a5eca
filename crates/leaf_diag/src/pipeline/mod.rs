pub mod builder;

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::{
    algorithms::{draw_contours, in_range, count_non_zero},
    classification::severity_ratio,
    config::AnalysisConfig,
    error::{LeafDiagError, Result},
    runtime::VisionRuntime,
    traits::{ColorSpaceConverter, ContourApproximation, ContourExtractor},
    types::{AnalysisResult, ContourSet, LesionContour},
    workspace::BufferLedger,
};

/// Leaf/lesion segmentation, measurement and classification of one bitmap.
pub struct LeafAnalyzer {
    runtime: Arc<VisionRuntime>,
    config: AnalysisConfig,
    color_converter: Option<Box<dyn ColorSpaceConverter>>,
    contour_extractor: Box<dyn ContourExtractor>,
    approximation: Box<dyn ContourApproximation>,
    ledger: BufferLedger,
}

impl LeafAnalyzer {
    /// Create a new analyzer builder
    pub fn builder() -> builder::AnalyzerBuilder {
        builder::AnalyzerBuilder::new()
    }

    pub fn new(
        runtime: Arc<VisionRuntime>,
        config: AnalysisConfig,
        color_converter: Option<Box<dyn ColorSpaceConverter>>,
        contour_extractor: Box<dyn ContourExtractor>,
        approximation: Box<dyn ContourApproximation>,
    ) -> Self {
        Self {
            runtime,
            config,
            color_converter,
            contour_extractor,
            approximation,
            ledger: BufferLedger::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Arc<VisionRuntime> {
        &self.runtime
    }

    pub fn is_ready(&self) -> bool {
        self.runtime.is_ready()
    }

    /// Bookkeeping of the working buffers used by [`Self::analyze`].
    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    /// Run the full analysis on a decoded RGB or RGBA bitmap.
    pub fn analyze(&self, image: &DynamicImage) -> Result<AnalysisResult> {
        // Readiness is checked before any working buffer exists.
        let backend = self.runtime.backend()?;

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(LeafDiagError::ProcessingFailure(format!(
                "bitmap has no pixels ({width}x{height})"
            )));
        }
        info!("Analyzing {}x{} bitmap", width, height);

        // Step 1: Drop alpha and convert to HSV
        let rgb = self.ledger.scoped(image.to_rgb8());
        let hsv = match &self.color_converter {
            Some(converter) => converter.convert(&rgb),
            None => backend.converter().convert(&rgb),
        }
        .map_err(into_processing_failure)?;
        let hsv = self.ledger.scoped(hsv);

        // Step 2: Threshold both tissue classes on the same HSV image
        let leaf_mask = self.ledger.scoped(in_range(&hsv, &self.config.leaf_range));
        let lesion_mask = self.ledger.scoped(in_range(&hsv, &self.config.lesion_range));

        // Step 3: Measure
        let leaf_area = count_non_zero(&leaf_mask);
        let lesion_area = count_non_zero(&lesion_mask);
        let ratio = severity_ratio(leaf_area, lesion_area);
        debug!(leaf_area, lesion_area, ratio, "Measured tissue areas");

        // Step 4: Outline lesions
        let contours = self.ledger.scoped(self.lesion_contours(&lesion_mask));
        let mut annotated = self.ledger.scoped(image.to_rgba8());
        draw_contours(&mut annotated, &contours, &self.config.overlay);
        debug!("Drew {} lesion outlines", contours.len());

        let result = AnalysisResult::assemble(
            annotated.into_inner(),
            leaf_area,
            lesion_area,
            ratio,
            contours.into_inner(),
        );
        info!(
            "Severity {}% ({})",
            result.severity_display(),
            result.band
        );
        Ok(result)
    }

    fn lesion_contours(&self, lesion_mask: &image::GrayImage) -> ContourSet {
        match self.contour_extractor.extract_contours(lesion_mask) {
            Ok(contours) => contours
                .iter()
                .map(|points| LesionContour::new(self.approximation.approximate(points)))
                .filter(|contour| !contour.is_empty())
                .collect(),
            Err(err) => {
                warn!("Contour extraction failed, drawing no outlines: {}", err);
                Vec::new()
            }
        }
    }
}

fn into_processing_failure(err: LeafDiagError) -> LeafDiagError {
    match err {
        LeafDiagError::ProcessingFailure(_) => err,
        other => LeafDiagError::ProcessingFailure(other.to_string()),
    }
}

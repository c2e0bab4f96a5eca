//! # Leaf Disease-Severity Estimation
//!
//! Estimates how much of a photographed leaf is diseased by color-segmenting
//! it into green "leaf" tissue and brown "lesion" tissue.
//!
//! ## Core Features
//!
//! - **HSV Segmentation**: fixed-point RGB to 8-bit HSV conversion and inclusive range masks
//! - **Measurement**: exact pixel counts and an unclamped lesion-to-leaf severity ratio
//! - **Classification**: four ordered severity bands with advisory messages
//! - **Overlay**: external lesion contours, compressed to corners, drawn on a copy of the input
//! - **Lifecycle**: an explicit readiness state for the vision backend and scoped working buffers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use leaf_diag::{LeafAnalyzer, VisionRuntime, acquisition::acquire_file, AcquisitionLimits};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // Wait for the backend before analyzing anything
//! let runtime = VisionRuntime::load_default().await?;
//! let analyzer = LeafAnalyzer::builder().build(runtime);
//!
//! let image = acquire_file("leaf.jpg", &AcquisitionLimits::default()).await?;
//! let result = analyzer.analyze(&image)?;
//!
//! println!("{}% - {}", result.severity_display(), result.diagnosis);
//! result.annotated.save("leaf_annotated.png")?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod classification;
pub mod config;
pub mod pipeline;
pub mod runtime;
pub mod workspace;
pub mod acquisition;
pub mod session;

// Re-exports for convenience
pub use error::{LeafDiagError, Result};
pub use types::{AnalysisResult, AnalysisSummary, ContourSet, HsvImage, HsvRange, LesionContour};
pub use traits::*;
pub use classification::{SeverityBand, severity_ratio};
pub use config::{AcquisitionLimits, AnalysisConfig, OverlayStyle, MAX_FILE_BYTES, MAX_STROKE_WIDTH};
pub use pipeline::{LeafAnalyzer, builder::AnalyzerBuilder};
pub use runtime::{Readiness, VisionBackend, VisionRuntime};
pub use session::DiagnosisSession;

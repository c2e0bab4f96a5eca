//! Tunable parameters of the analysis.
//!
//! Every field has a default, so partial config files only need to name the
//! values they override.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{LeafDiagError, Result},
    types::HsvRange,
};

/// Largest accepted source file, 10 MiB.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const MAX_HUE: u8 = 179;

/// Widest outline the overlay will draw, in pixels.
pub const MAX_STROKE_WIDTH: u32 = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    /// HSV bounds of healthy green tissue
    pub leaf_range: HsvRange,
    /// HSV bounds of brown, necrotic tissue
    pub lesion_range: HsvRange,
    pub overlay: OverlayStyle,
    pub acquisition: AcquisitionLimits,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            leaf_range: HsvRange::LEAF,
            lesion_range: HsvRange::LESION,
            overlay: OverlayStyle::default(),
            acquisition: AcquisitionLimits::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        validate_range("leaf_range", &self.leaf_range)?;
        validate_range("lesion_range", &self.lesion_range)?;

        if !(1..=MAX_STROKE_WIDTH).contains(&self.overlay.stroke_width) {
            return Err(LeafDiagError::InvalidConfig(format!(
                "overlay.stroke_width must be between 1 and {MAX_STROKE_WIDTH}, got {}",
                self.overlay.stroke_width
            )));
        }
        if self.acquisition.max_file_bytes == 0 {
            return Err(LeafDiagError::InvalidConfig(
                "acquisition.max_file_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }
}

fn validate_range(name: &str, range: &HsvRange) -> Result<()> {
    if range.upper[0] > MAX_HUE {
        return Err(LeafDiagError::InvalidConfig(format!(
            "{name}: hue upper bound {} exceeds {MAX_HUE}",
            range.upper[0]
        )));
    }
    for (channel, label) in ["hue", "saturation", "value"].iter().enumerate() {
        if range.lower[channel] > range.upper[channel] {
            return Err(LeafDiagError::InvalidConfig(format!(
                "{name}: {label} lower bound {} is above upper bound {}",
                range.lower[channel], range.upper[channel]
            )));
        }
    }
    Ok(())
}

/// How lesion outlines are drawn on the annotated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OverlayStyle {
    #[schemars(range(min = 1, max = 32))]
    pub stroke_width: u32,
    /// RGBA
    pub color: [u8; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 2,
            color: [255, 0, 0, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AcquisitionLimits {
    pub max_file_bytes: u64,
}

impl Default for AcquisitionLimits {
    fn default() -> Self {
        Self { max_file_bytes: MAX_FILE_BYTES }
    }
}

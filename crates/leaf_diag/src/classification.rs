use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

/// Ordered disease-extent categories derived from the severity ratio.
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, PartialOrd, Ord, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SeverityBand {
    /// Ratio below 5
    Healthy,
    /// 5 up to 15
    Mild,
    /// 15 up to 30
    Moderate,
    /// 30 and above
    Severe,
}

impl SeverityBand {
    pub const MILD_FROM: f64 = 5.0;
    pub const MODERATE_FROM: f64 = 15.0;
    pub const SEVERE_FROM: f64 = 30.0;

    /// Map a severity ratio onto its band. Total over all inputs: anything
    /// below 5 (including NaN) is healthy, anything from 30 up is severe.
    pub fn classify(severity_ratio: f64) -> Self {
        if severity_ratio >= Self::SEVERE_FROM {
            Self::Severe
        } else if severity_ratio >= Self::MODERATE_FROM {
            Self::Moderate
        } else if severity_ratio >= Self::MILD_FROM {
            Self::Mild
        } else {
            Self::Healthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy leaf",
            Self::Mild => "Mild infection",
            Self::Moderate => "Moderate infection",
            Self::Severe => "Severe infection",
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Healthy => "leaf appears healthy, minimal disease signs",
            Self::Mild => "light infection, monitoring recommended",
            Self::Moderate => "moderate infection, treatment advised",
            Self::Severe => "severe infection, urgent treatment advised",
        }
    }

    /// Human-readable diagnosis line, label followed by advisory.
    pub fn diagnosis(&self) -> String {
        format!("{} - {}", self.label(), self.advisory())
    }

    /// Stable identifiers of every band, mildest first.
    pub fn band_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }
}

/// Lesion-to-leaf pixel ratio in percent. Zero when no leaf pixels were
/// found; deliberately not clamped to 100.
pub fn severity_ratio(leaf_area: u64, lesion_area: u64) -> f64 {
    if leaf_area == 0 {
        0.0
    } else {
        lesion_area as f64 / leaf_area as f64 * 100.0
    }
}

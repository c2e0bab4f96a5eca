use leaf_diag::{AnalysisConfig, AnalysisSummary, LeafDiagError};

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use thiserror::Error;


#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Analysis(#[from] LeafDiagError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, CliError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }
}

/// Load and validate an analysis configuration, format chosen by extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig, CliError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;

    let config = match format {
        ConfigFormat::Toml => config_from_toml(&content)?,
        ConfigFormat::Json => config_from_json(&content)?,
    };
    config.validate()?;
    Ok(config)
}

pub fn config_from_toml(content: &str) -> Result<AnalysisConfig, CliError> {
    Ok(toml::from_str(content)?)
}

pub fn config_from_json(content: &str) -> Result<AnalysisConfig, CliError> {
    Ok(serde_json::from_str(content)?)
}

/// Save a configuration, format chosen by extension
pub fn save_config<P: AsRef<Path>>(config: &AnalysisConfig, path: P) -> Result<(), CliError> {
    let path = path.as_ref();
    let content = match ConfigFormat::from_path(path)? {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
    };
    fs::write(path, content)?;
    Ok(())
}

/// JSON schema of the configuration file
pub fn config_schema() -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&AnalysisConfig::schema())?)
}

/// Group digits in threes: `12345` becomes `"12,345"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Metrics and diagnosis block printed after an analysis
pub fn render_report(summary: &AnalysisSummary) -> String {
    let mut lines = vec![
        "🍃 Analysis results".to_string(),
        format!("   Image:          {}x{}", summary.image_width, summary.image_height),
        format!("   🌿 Leaf area:    {} px²", format_count(summary.leaf_area)),
        format!("   🦠 Lesion area:  {} px²", format_count(summary.lesion_area)),
        format!("   📊 Severity:     {:.1}% [{}]", summary.severity_ratio, summary.band),
    ];
    if summary.lesion_regions > 0 {
        lines.push(format!("   Lesion regions: {}", summary.lesion_regions));
    }
    lines.push(format!("   {} {} - {}", band_marker(summary), summary.label, summary.advisory));
    lines.join("\n")
}

/// Error block printed instead of the report
pub fn render_error(err: &LeafDiagError) -> String {
    let hint = match err {
        LeafDiagError::NotReady => "the vision backend is still loading, try again shortly",
        LeafDiagError::InvalidInput(_) | LeafDiagError::ReadFailure { .. } => "check the selected file",
        _ => "the image could not be analyzed",
    };
    format!("❌ Error\n   {err}\n   ({hint})")
}

/// Exit status after a failed analysis: 2 for a bad input file, 1 otherwise.
///
/// The error has already been shown through [`render_error`], so it is not
/// handed back to `color_eyre`.
pub fn failure_exit_code(err: &LeafDiagError) -> ExitCode {
    if err.is_input_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

fn band_marker(summary: &AnalysisSummary) -> &'static str {
    use leaf_diag::SeverityBand;
    match summary.band {
        SeverityBand::Healthy => "✅",
        SeverityBand::Mild => "⚠️",
        SeverityBand::Moderate => "🔶",
        SeverityBand::Severe => "🚨",
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeafDiagError {
    #[error("Vision backend is not ready yet, please wait for it to finish loading")]
    NotReady,

    #[error("Vision backend failed to initialize: {0}")]
    InitializationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to read {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis failed: {0}")]
    ProcessingFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LeafDiagError {
    /// True for failures raised before the analysis core was reached.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ReadFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, LeafDiagError>;

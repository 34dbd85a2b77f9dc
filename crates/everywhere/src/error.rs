//! Error types for analysis runs.

use everywhere_data::PanelError;
use everywhere_output::ExportError;
use everywhere_risk::{CorrelationError, PcaError};
use everywhere_weighting::WeightingError;
use thiserror::Error;

/// Errors that can occur while configuring or running an analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Inconsistent configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Panel loading or splitting error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Weighting or aggregation error
    #[error("Weighting error: {0}")]
    Weighting(#[from] WeightingError),

    /// Correlation matrix error
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// Principal component error
    #[error("PCA error: {0}")]
    Pca(#[from] PcaError),

    /// Export error
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for analysis runs
pub type Result<T> = std::result::Result<T, AnalysisError>;

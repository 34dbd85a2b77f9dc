//! Error types for weighting and aggregation.

use everywhere_data::PanelError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Result type for weighting operations.
pub type Result<T> = std::result::Result<T, WeightingError>;

/// Errors that can occur while weighting or aggregating returns.
#[derive(Debug, Error)]
pub enum WeightingError {
    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A portfolio does not share the first portfolio's period index
    #[error("Portfolio {portfolio} does not share the period index of portfolio 0")]
    IndexMismatch {
        /// Position of the offending portfolio
        portfolio: usize,
    },

    /// Panel error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Rolling computation failed inside polars
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

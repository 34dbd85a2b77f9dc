//! Timestamped JSON envelope around the results of one analysis run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A report from one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Name of the analysis (e.g. `correlate`).
    pub analysis: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// First and last period of the input panel (YYYYMM).
    pub period_range: Option<(u32, u32)>,

    /// Analysis results, missing values as `null`.
    pub contents: serde_json::Value,
}

impl Report {
    /// Stamp `contents` with the current time.
    pub fn new(
        analysis: impl Into<String>,
        period_range: Option<(u32, u32)>,
        contents: serde_json::Value,
    ) -> Self {
        Self {
            analysis: analysis.into(),
            timestamp: Utc::now(),
            period_range,
            contents,
        }
    }

    /// Render as JSON, on one line unless `pretty`.
    pub fn to_json(&self, pretty: bool) -> Result<String, ReportError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

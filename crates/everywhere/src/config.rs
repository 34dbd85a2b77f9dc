//! Configuration of a full analysis run.

use everywhere_data::{ColumnSelection, PortfolioLayout};
use everywhere_risk::{CorrelationConfig, PcaConfig};
use everywhere_weighting::QuarterlyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AnalysisError, Result};

fn default_date_column() -> String {
    "date".to_string()
}

/// Column group and settings for principal component extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaSettings {
    /// Columns to decompose
    pub selection: ColumnSelection,

    /// Decomposition settings
    #[serde(default)]
    pub config: PcaConfig,
}

/// Everything needed to run an analysis over one return panel.
///
/// Loaded from JSON; every field except `layout` has a default.
///
/// ```json
/// {
///   "layout": { "starts": [0, 1], "group_size": 2, "stride": 2 },
///   "labels": ["VAL", "MOM"],
///   "quarterly": { "weighting": { "roll_window": 36 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Name of the date column in tabular input (default: `date`)
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// How the panel is split into portfolios
    pub layout: PortfolioLayout,

    /// One label per portfolio; `P1`, `P2`, ... when empty
    #[serde(default)]
    pub labels: Vec<String>,

    /// Weighting and quarterly aggregation
    #[serde(default)]
    pub quarterly: QuarterlyConfig,

    /// Diagonal settings of the correlation matrix
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Optional principal component extraction
    #[serde(default)]
    pub pca: Option<PcaSettings>,
}

impl AnalysisConfig {
    /// Configuration with default settings for the given layout.
    pub fn new(layout: PortfolioLayout) -> Self {
        Self {
            date_column: default_date_column(),
            layout,
            labels: Vec::new(),
            quarterly: QuarterlyConfig::default(),
            correlation: CorrelationConfig::default(),
            pca: None,
        }
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the layout and labels agree.
    pub fn validate(&self) -> Result<()> {
        if self.layout.starts.is_empty() {
            return Err(AnalysisError::Config(
                "layout must name at least one portfolio".to_string(),
            ));
        }
        if self.layout.group_size == 0 {
            return Err(AnalysisError::Config(
                "group_size must be positive".to_string(),
            ));
        }
        if !self.labels.is_empty() && self.labels.len() != self.layout.starts.len() {
            return Err(AnalysisError::Config(format!(
                "{} labels for {} portfolios",
                self.labels.len(),
                self.layout.starts.len()
            )));
        }
        Ok(())
    }

    /// Labels to use, generated when none were configured.
    pub fn resolved_labels(&self) -> Vec<String> {
        if self.labels.is_empty() {
            (1..=self.layout.starts.len())
                .map(|i| format!("P{i}"))
                .collect()
        } else {
            self.labels.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use everywhere_risk::PcaBasis;

    #[test]
    fn test_minimal_json() {
        let config = AnalysisConfig::from_json(r#"{"layout": {"starts": [0, 1, 2]}}"#).unwrap();
        assert_eq!(config.date_column, "date");
        assert_eq!(config.layout.group_size, 1);
        assert_eq!(config.quarterly.weighting.roll_window, 36);
        assert!(config.quarterly.ignore_nan);
        assert!(config.correlation.zero_as_missing);
        assert!(config.pca.is_none());
        assert_eq!(config.resolved_labels(), vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "date_column": "month",
            "layout": {"starts": [0, 1], "group_size": 2, "stride": 2},
            "labels": ["VAL", "MOM"],
            "quarterly": {"weighting": {"roll_window": 12}, "ignore_nan": false},
            "correlation": {"zero_as_missing": false},
            "pca": {
                "selection": {"start": 0, "group_size": 3, "stride": 2},
                "config": {"basis": "covariance"}
            }
        }"#;
        let config = AnalysisConfig::from_json(json).unwrap();
        assert_eq!(config.date_column, "month");
        assert_eq!(config.quarterly.weighting.roll_window, 12);
        assert_eq!(config.quarterly.weighting.min_count, 1);
        assert!(!config.quarterly.ignore_nan);
        assert!(!config.correlation.zero_as_missing);

        let pca = config.pca.unwrap();
        assert_eq!(pca.selection.indices().unwrap(), vec![0, 2, 4]);
        assert_eq!(pca.config.basis, PcaBasis::Covariance);
        assert_eq!(pca.config.max_sweeps, 100);
    }

    #[test]
    fn test_label_count_checked() {
        let json = r#"{"layout": {"starts": [0, 1]}, "labels": ["only"]}"#;
        assert!(matches!(
            AnalysisConfig::from_json(json),
            Err(AnalysisError::Config(_))
        ));
    }

    #[test]
    fn test_empty_layout_rejected() {
        let config = AnalysisConfig::new(PortfolioLayout::singles(vec![]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_layout_is_parse_error() {
        assert!(matches!(
            AnalysisConfig::from_json("{}"),
            Err(AnalysisError::Json(_))
        ));
    }
}

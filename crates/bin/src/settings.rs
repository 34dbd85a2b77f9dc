//! Analysis configuration from command-line flags.
//!
//! A JSON file given with `--config` is loaded first; any flag given on the
//! command line overrides the matching field.

use clap::Args;
use everywhere::data::{PortfolioLayout, ReturnPanel};
use everywhere::{AnalysisConfig, AnalysisError};
use std::path::PathBuf;
use tracing::debug;

/// Input panel, portfolio layout and weighting flags
#[derive(Debug, Args)]
pub(crate) struct LayoutArgs {
    /// Monthly return panel (CSV)
    #[arg(long)]
    panel: PathBuf,

    /// Analysis configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the date column
    #[arg(long)]
    date_column: Option<String>,

    /// First column of each portfolio, comma separated
    #[arg(long, value_delimiter = ',')]
    starts: Option<Vec<usize>>,

    /// Columns per portfolio
    #[arg(long)]
    group_size: Option<usize>,

    /// Distance between columns of one portfolio
    #[arg(long)]
    stride: Option<usize>,

    /// Portfolio labels, comma separated
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,

    /// Rolling volatility window in months
    #[arg(long)]
    roll_window: Option<usize>,

    /// Minimum defined volatilities for a portfolio total
    #[arg(long)]
    min_count: Option<usize>,

    /// Keep quarterly sums of exactly zero instead of treating them as missing
    #[arg(long)]
    keep_zeros: bool,
}

impl LayoutArgs {
    fn date_column(&self) -> &str {
        self.date_column.as_deref().unwrap_or("date")
    }

    /// Load the panel, honouring a date column named in the config file.
    pub(crate) fn read_panel(&self) -> Result<ReturnPanel, AnalysisError> {
        let date_column = match (&self.date_column, &self.config) {
            (None, Some(path)) => AnalysisConfig::from_path(path)?.date_column,
            _ => self.date_column().to_string(),
        };
        Ok(ReturnPanel::read_csv(&self.panel, &date_column)?)
    }

    /// Merge the config file (if any) with the flags.
    pub(crate) fn into_config(self) -> Result<AnalysisConfig, AnalysisError> {
        let mut config = match (&self.config, &self.starts) {
            (Some(path), _) => AnalysisConfig::from_path(path)?,
            (None, Some(starts)) => AnalysisConfig::new(PortfolioLayout::singles(starts.clone())),
            (None, None) => {
                return Err(AnalysisError::Config(
                    "either --config or --starts is required".to_string(),
                ));
            }
        };

        if let Some(date_column) = self.date_column {
            config.date_column = date_column;
        }
        if let Some(starts) = self.starts {
            config.layout.starts = starts;
        }
        if let Some(group_size) = self.group_size {
            config.layout.group_size = group_size;
        }
        if self.stride.is_some() {
            config.layout.stride = self.stride;
        }
        if let Some(labels) = self.labels {
            config.labels = labels;
        }
        if let Some(roll_window) = self.roll_window {
            config.quarterly.weighting.roll_window = roll_window;
        }
        if let Some(min_count) = self.min_count {
            config.quarterly.weighting.min_count = min_count;
        }
        if self.keep_zeros {
            config.quarterly.ignore_nan = false;
            config.correlation.zero_as_missing = false;
        }

        config.validate()?;
        debug!(?config, "resolved analysis configuration");
        Ok(config)
    }
}

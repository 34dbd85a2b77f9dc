//! End-to-end analysis: split, weight, aggregate, correlate, decompose.

use everywhere_data::{PanelSplitter, QuarterlySeries, ReturnPanel};
use everywhere_output::{QuarterlyExport, Report};
use everywhere_risk::{CorrelationAnalyzer, CorrelationMatrix, PcaReducer, PrincipalComponent};
use everywhere_weighting::QuarterlyAggregator;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::Result;

/// Results of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Weighted quarterly returns per portfolio
    pub quarterly: QuarterlyExport,

    /// Matrix as computed: upper triangle and diagonal only
    pub raw_correlation: CorrelationMatrix,

    /// Symmetric correlation matrix
    pub correlation: CorrelationMatrix,

    /// First principal component, when configured
    pub pca: Option<PrincipalComponent>,

    /// First and last period of the input panel (YYYYMM)
    pub period_range: Option<(u32, u32)>,
}

impl AnalysisReport {
    /// Portfolio labels
    pub fn labels(&self) -> &[String] {
        &self.quarterly.labels
    }

    /// Wrap the results in a timestamped report.
    pub fn to_report(&self, analysis: &str) -> Result<Report> {
        let contents = serde_json::to_value(ReportContents::from(self))?;
        Ok(Report::new(analysis, self.period_range, contents))
    }
}

/// JSON view of a report with missing values as `null`
#[derive(Debug, Serialize)]
struct ReportContents<'a> {
    labels: &'a [String],
    correlation: Vec<Vec<Option<f64>>>,
    quarterly: Vec<QuarterRow>,
    pca: Option<&'a PrincipalComponent>,
}

#[derive(Debug, Serialize)]
struct QuarterRow {
    quarter: String,
    values: Vec<Option<f64>>,
}

impl<'a> From<&'a AnalysisReport> for ReportContents<'a> {
    fn from(report: &'a AnalysisReport) -> Self {
        Self {
            labels: report.labels(),
            correlation: report.correlation.to_rows(),
            quarterly: report
                .quarterly
                .rows()
                .into_iter()
                .map(|(quarter, values)| QuarterRow { quarter, values })
                .collect(),
            pca: report.pca.as_ref(),
        }
    }
}

/// A configured analysis, reusable across panels
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
    labels: Vec<String>,
    aggregator: QuarterlyAggregator,
    analyzer: CorrelationAnalyzer,
    reducer: Option<PcaReducer>,
}

impl Analysis {
    /// Validate the configuration and build the pipeline stages.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let aggregator = QuarterlyAggregator::new(config.quarterly)?;
        let analyzer = CorrelationAnalyzer::new(config.correlation);
        let reducer = config
            .pca
            .as_ref()
            .map(|settings| PcaReducer::new(settings.config))
            .transpose()?;
        Ok(Self {
            labels: config.resolved_labels(),
            config,
            aggregator,
            analyzer,
            reducer,
        })
    }

    /// Configuration in use
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Portfolio labels in use
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Split the panel into the configured portfolios.
    pub fn portfolios(&self, panel: &ReturnPanel) -> Result<Vec<ReturnPanel>> {
        Ok(PanelSplitter::split_layout(panel, &self.config.layout)?)
    }

    /// Weighted quarterly returns, one series per portfolio.
    pub fn quarterly(&self, panel: &ReturnPanel) -> Result<Vec<QuarterlySeries>> {
        let portfolios = self.portfolios(panel)?;
        Ok(self.aggregator.aggregate(&portfolios)?)
    }

    /// First principal component of the configured column group, if any.
    pub fn principal_component(&self, panel: &ReturnPanel) -> Result<Option<PrincipalComponent>> {
        let (Some(reducer), Some(settings)) = (&self.reducer, &self.config.pca) else {
            return Ok(None);
        };
        Ok(Some(reducer.first_component(panel, &settings.selection)?))
    }

    /// Run every stage over a panel.
    pub fn run(&self, panel: &ReturnPanel) -> Result<AnalysisReport> {
        info!(
            periods = panel.n_periods(),
            columns = panel.width(),
            portfolios = self.labels.len(),
            "starting analysis"
        );

        let portfolios = self.portfolios(panel)?;
        let quarterly = self.aggregator.aggregate(&portfolios)?;
        for (label, series) in self.labels.iter().zip(&quarterly) {
            debug!(
                portfolio = %label,
                defined = series.count_defined(),
                quarters = series.quarters().len(),
                "aggregated quarterly returns"
            );
        }

        let raw_correlation = self
            .analyzer
            .analyze(&quarterly, &portfolios, &self.labels)?;
        let correlation = raw_correlation.symmetrize();
        let pca = self.principal_component(panel)?;

        let period_range = panel
            .periods()
            .first()
            .zip(panel.periods().last())
            .map(|(first, last)| (first.value(), last.value()));

        info!(
            quarters = quarterly.first().map_or(0, |s| s.quarters().len()),
            pca = pca.is_some(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            quarterly: QuarterlyExport::new(self.labels.clone(), quarterly)?,
            raw_correlation,
            correlation,
            pca,
            period_range,
        })
    }

    /// Run over a raw frame, reading periods from the configured date column.
    pub fn run_frame(&self, frame: &DataFrame) -> Result<AnalysisReport> {
        let panel = ReturnPanel::from_dataframe(frame, &self.config.date_column)?;
        self.run(&panel)
    }

    /// Run over a CSV file.
    pub fn run_csv(&self, path: impl AsRef<Path>) -> Result<AnalysisReport> {
        let panel = ReturnPanel::read_csv(path, &self.config.date_column)?;
        self.run(&panel)
    }
}

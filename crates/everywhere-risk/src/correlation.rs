//! Average correlation matrix across portfolios
//!
//! The off-diagonal entry (i, j), i < j, is the Pearson correlation between the
//! volatility-weighted quarterly returns of portfolios i and j. Only the upper
//! triangle is filled; [`CorrelationMatrix::symmetrize`] mirrors it.
//!
//! The diagonal entry (i, i) summarises how correlated the assets inside
//! portfolio i are without building the asset-level matrix. Unweighted monthly
//! returns are summed per quarter, and for every asset j:
//!
//! ρ_j = corr(r_j, Σ_{k≠j} r_k)
//!
//! The diagonal is the mean of ρ_j over the assets of the portfolio.

use everywhere_data::{PanelError, QuarterKey, QuarterlySeries, ReturnPanel};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::stats::pearson;

/// Errors that can occur while building a correlation matrix
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// Inputs of different lengths
    #[error("Dimension mismatch: {labels} labels, {weighted} weighted series, {unweighted} unweighted panels")]
    DimensionMismatch {
        /// Number of labels
        labels: usize,
        /// Number of weighted series
        weighted: usize,
        /// Number of unweighted panels
        unweighted: usize,
    },

    /// An unweighted panel does not share the first panel's index
    #[error("Unweighted panel {portfolio} does not share the period index of panel 0")]
    IndexMismatch {
        /// Position of the offending panel
        portfolio: usize,
    },

    /// Label not present in the matrix
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Values are not a square matrix with one row per label
    #[error("{labels} labels for a {rows}x{cols} matrix")]
    NotSquare {
        /// Number of labels
        labels: usize,
        /// Rows of the values
        rows: usize,
        /// Columns of the values
        cols: usize,
    },

    /// Quarterly resampling failed
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),
}

/// Correlation analysis configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Treat per-asset quarterly sums of exactly zero as missing when building
    /// the diagonal (default: true)
    pub zero_as_missing: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            zero_as_missing: true,
        }
    }
}

/// Square matrix labelled by portfolio, `NaN` where not computable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Array2<f64>,
}

#[derive(Deserialize)]
struct RawMatrix {
    labels: Vec<String>,
    values: Array2<f64>,
}

impl TryFrom<RawMatrix> for CorrelationMatrix {
    type Error = CorrelationError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        Self::new(raw.labels, raw.values)
    }
}

impl CorrelationMatrix {
    /// Matrix from labels and an n x n array, n = number of labels.
    pub fn new(labels: Vec<String>, values: Array2<f64>) -> Result<Self, CorrelationError> {
        let (rows, cols) = values.dim();
        if rows != labels.len() || cols != labels.len() {
            return Err(CorrelationError::NotSquare {
                labels: labels.len(),
                rows,
                cols,
            });
        }
        Ok(Self { labels, values })
    }

    /// Empty matrix with every entry missing
    pub fn missing(labels: Vec<String>) -> Self {
        let n = labels.len();
        Self {
            labels,
            values: Array2::from_elem((n, n), f64::NAN),
        }
    }

    /// Row and column labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw values, `NaN` where missing
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of portfolios
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entry (i, j), `None` when missing or out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get([i, j]).copied().filter(|v| !v.is_nan())
    }

    /// Entry by row and column label
    pub fn get_by_label(&self, row: &str, col: &str) -> Result<Option<f64>, CorrelationError> {
        let i = self.position(row)?;
        let j = self.position(col)?;
        Ok(self.get(i, j))
    }

    fn position(&self, label: &str) -> Result<usize, CorrelationError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| CorrelationError::UnknownLabel(label.to_string()))
    }

    /// Diagonal entries
    pub fn diagonal(&self) -> Vec<Option<f64>> {
        (0..self.len()).map(|i| self.get(i, i)).collect()
    }

    /// Copy of the matrix with the upper triangle mirrored into the lower one.
    pub fn symmetrize(&self) -> Self {
        let mut values = self.values.clone();
        let n = self.len();
        for i in 0..n {
            for j in (i + 1)..n {
                values[[j, i]] = values[[i, j]];
            }
        }
        Self {
            labels: self.labels.clone(),
            values,
        }
    }

    /// Rows of optional entries, for serialization and rendering
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.len())
            .map(|i| (0..self.len()).map(|j| self.get(i, j)).collect())
            .collect()
    }
}

/// Builds the correlation matrix from weighted and unweighted portfolio returns
#[derive(Debug, Clone, Default)]
pub struct CorrelationAnalyzer {
    config: CorrelationConfig,
}

impl CorrelationAnalyzer {
    /// Create a new analyzer
    pub const fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Build the matrix.
    ///
    /// # Arguments
    /// * `weighted` - Quarterly volatility-weighted returns, one series per portfolio
    /// * `unweighted` - Raw monthly returns, one panel per portfolio
    /// * `labels` - Row/column label per portfolio
    pub fn analyze(
        &self,
        weighted: &[QuarterlySeries],
        unweighted: &[ReturnPanel],
        labels: &[String],
    ) -> Result<CorrelationMatrix, CorrelationError> {
        let n = labels.len();
        if weighted.len() != n || unweighted.len() != n {
            return Err(CorrelationError::DimensionMismatch {
                labels: n,
                weighted: weighted.len(),
                unweighted: unweighted.len(),
            });
        }
        if let Some(first) = unweighted.first()
            && let Some(portfolio) = unweighted.iter().position(|p| !p.same_index(first))
        {
            return Err(CorrelationError::IndexMismatch { portfolio });
        }

        let mut matrix = CorrelationMatrix::missing(labels.to_vec());

        for i in 0..n {
            for j in (i + 1)..n {
                let (x, y) = align(&weighted[i], &weighted[j]);
                if let Some(rho) = pearson(x.view(), y.view()) {
                    matrix.values[[i, j]] = rho;
                } else {
                    debug!(row = %labels[i], col = %labels[j], "correlation not computable");
                }
            }
        }

        for (i, panel) in unweighted.iter().enumerate() {
            match self.within_portfolio(panel)? {
                Some(rho) => matrix.values[[i, i]] = rho,
                None => warn!(portfolio = %labels[i], "within-portfolio correlation not computable"),
            }
        }

        Ok(matrix)
    }

    /// Mean correlation of each asset with the sum of the other assets.
    ///
    /// `None` for a single-asset portfolio or when any asset's correlation is
    /// not computable.
    pub fn within_portfolio(
        &self,
        returns: &ReturnPanel,
    ) -> Result<Option<f64>, CorrelationError> {
        let k = returns.width();
        if k < 2 {
            return Ok(None);
        }
        let quarterly = returns.resample_quarterly(self.config.zero_as_missing)?;
        let values = quarterly.values();

        // Row totals skip missing assets
        let totals: Array1<f64> =
            values.map_axis(Axis(1), |row| row.iter().filter(|v| !v.is_nan()).sum());

        let mut sum = 0.0;
        for j in 0..k {
            let own = values.column(j);
            let others = &totals - &own;
            let Some(rho) = pearson(own, others.view()) else {
                return Ok(None);
            };
            sum += rho;
        }
        Ok(Some(sum / k as f64))
    }
}

/// Values of two series on their common quarters.
fn align(a: &QuarterlySeries, b: &QuarterlySeries) -> (Array1<f64>, Array1<f64>) {
    if a.quarters() == b.quarters() {
        return (a.values().clone(), b.values().clone());
    }
    let lookup: HashMap<QuarterKey, f64> = b
        .quarters()
        .iter()
        .copied()
        .zip(b.values().iter().copied())
        .collect();
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .quarters()
        .iter()
        .zip(a.values().iter())
        .filter_map(|(q, &v)| lookup.get(q).map(|&w| (v, w)))
        .unzip();
    (Array1::from_vec(x), Array1::from_vec(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use everywhere_data::PeriodKey;

    fn quarters(n: usize) -> Vec<QuarterKey> {
        (0..n)
            .map(|i| QuarterKey {
                year: 2000 + (i / 4) as u32,
                quarter: (i % 4) as u32 + 1,
            })
            .collect()
    }

    fn monthly(columns: Vec<Vec<f64>>) -> ReturnPanel {
        let n = columns[0].len();
        let periods = (0..n)
            .map(|i| PeriodKey::from_ymd(2000 + (i / 12) as u32, (i % 12) as u32 + 1).unwrap())
            .collect();
        ReturnPanel::from_columns(
            periods,
            columns
                .into_iter()
                .enumerate()
                .map(|(j, v)| (format!("a{j}"), v))
                .collect(),
        )
        .unwrap()
    }

    /// One return per quarter (first month), zeros elsewhere
    fn quarterly_driven(per_quarter: &[Vec<f64>]) -> ReturnPanel {
        let columns = per_quarter
            .iter()
            .map(|q| {
                q.iter()
                    .flat_map(|&v| [v, 0.0, 0.0])
                    .collect::<Vec<f64>>()
            })
            .collect();
        monthly(columns)
    }

    #[test]
    fn test_matrix_accessors() {
        let mut m = CorrelationMatrix::missing(vec!["a".into(), "b".into()]);
        m.values[[0, 1]] = 0.5;
        assert_eq!(m.get(0, 1), Some(0.5));
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.get(5, 0), None);
        assert_eq!(m.get_by_label("a", "b").unwrap(), Some(0.5));
        assert!(m.get_by_label("a", "z").is_err());

        let s = m.symmetrize();
        assert_eq!(s.get(1, 0), Some(0.5));
        assert_eq!(s.get(0, 1), s.get(1, 0));
    }

    #[test]
    fn test_new_requires_square_values() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert!(CorrelationMatrix::new(labels.clone(), Array2::zeros((2, 2))).is_ok());
        assert!(matches!(
            CorrelationMatrix::new(labels, Array2::zeros((2, 3))),
            Err(CorrelationError::NotSquare { labels: 2, rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_deserialize_validates_shape() {
        let square = r#"{"labels":["a"],"values":{"v":1,"dim":[1,1],"data":[1.0]}}"#;
        let m: CorrelationMatrix = serde_json::from_str(square).unwrap();
        assert_eq!(m.get(0, 0), Some(1.0));

        let ragged = r#"{"labels":["a","b"],"values":{"v":1,"dim":[2,1],"data":[1.0,0.5]}}"#;
        assert!(serde_json::from_str::<CorrelationMatrix>(ragged).is_err());
    }

    #[test]
    fn test_within_portfolio_single_asset() {
        let analyzer = CorrelationAnalyzer::default();
        let panel = quarterly_driven(&[vec![0.01, 0.02, -0.01, 0.03]]);
        assert!(analyzer.within_portfolio(&panel).unwrap().is_none());
    }

    #[test]
    fn test_within_portfolio_two_assets() {
        // With two assets each asset's "rest" is the other asset, so both
        // correlations equal corr(a, b)
        let analyzer = CorrelationAnalyzer::default();
        let a = vec![0.01, 0.02, -0.01, 0.03, 0.02];
        let b = vec![0.02, 0.04, -0.02, 0.06, 0.04];
        let panel = quarterly_driven(&[a, b]);
        assert_abs_diff_eq!(analyzer.within_portfolio(&panel).unwrap().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_within_portfolio_averages_over_assets() {
        let analyzer = CorrelationAnalyzer::default();
        let cols = vec![
            vec![0.01, 0.03, -0.02, 0.04, 0.01, -0.01],
            vec![0.02, -0.01, 0.01, 0.03, -0.02, 0.02],
            vec![-0.01, 0.02, 0.03, -0.02, 0.01, 0.04],
        ];
        let panel = quarterly_driven(&cols);

        let mut expected = 0.0;
        for j in 0..3 {
            let own = Array1::from_vec(cols[j].clone());
            let others = Array1::from_vec(
                (0..6)
                    .map(|t| (0..3).filter(|&k| k != j).map(|k| cols[k][t]).sum())
                    .collect(),
            );
            expected += pearson(own.view(), others.view()).unwrap();
        }
        expected /= 3.0;

        assert_abs_diff_eq!(
            analyzer.within_portfolio(&panel).unwrap().unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_analyze_fills_upper_triangle() {
        let analyzer = CorrelationAnalyzer::default();
        let q = quarters(5);
        let weighted = vec![
            QuarterlySeries::new(q.clone(), vec![0.01, 0.02, 0.03, 0.02, 0.05]).unwrap(),
            QuarterlySeries::new(q.clone(), vec![0.02, 0.04, 0.06, 0.04, 0.10]).unwrap(),
            QuarterlySeries::new(q, vec![-0.01, -0.02, -0.03, -0.02, -0.05]).unwrap(),
        ];
        let unweighted = vec![
            quarterly_driven(&[vec![0.01, 0.02, -0.01, 0.03, 0.0]]),
            quarterly_driven(&[vec![0.01, 0.02, -0.01, 0.03, 0.0]]),
            quarterly_driven(&[vec![0.01, 0.02, -0.01, 0.03, 0.0]]),
        ];
        let labels = vec!["VAL".to_string(), "MOM".to_string(), "COMBO".to_string()];

        let m = analyzer.analyze(&weighted, &unweighted, &labels).unwrap();
        assert_abs_diff_eq!(m.get(0, 1).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.get(0, 2).unwrap(), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.get(1, 2).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.get(2, 1), None);
        // single-asset portfolios have no diagonal
        assert!(m.diagonal().iter().all(Option::is_none));

        let s = m.symmetrize();
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert_eq!(s.get(i, j), s.get(j, i));
                }
            }
        }
    }

    #[test]
    fn test_analyze_aligns_quarters() {
        let analyzer = CorrelationAnalyzer::default();
        let all = quarters(5);
        let a = QuarterlySeries::new(all.clone(), vec![1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        let b = QuarterlySeries::new(all[..4].to_vec(), vec![2.0, 4.0, 6.0, 8.0]).unwrap();
        let panel = quarterly_driven(&[vec![0.01, 0.02, -0.01, 0.03, 0.04]]);
        let labels = vec!["a".to_string(), "b".to_string()];

        let m = analyzer
            .analyze(&[a, b], &[panel.clone(), panel], &labels)
            .unwrap();
        assert_abs_diff_eq!(m.get(0, 1).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_analyze_insufficient_overlap() {
        let analyzer = CorrelationAnalyzer::default();
        let q = quarters(3);
        let a = QuarterlySeries::new(q.clone(), vec![1.0, f64::NAN, f64::NAN]).unwrap();
        let b = QuarterlySeries::new(q, vec![1.0, 2.0, 3.0]).unwrap();
        let panel = quarterly_driven(&[vec![0.01, 0.02, 0.03]]);
        let labels = vec!["a".to_string(), "b".to_string()];

        let m = analyzer
            .analyze(&[a, b], &[panel.clone(), panel], &labels)
            .unwrap();
        assert_eq!(m.get(0, 1), None);
    }

    #[test]
    fn test_analyze_dimension_mismatch() {
        let analyzer = CorrelationAnalyzer::default();
        let labels = vec!["a".to_string()];
        assert!(matches!(
            analyzer.analyze(&[], &[], &labels),
            Err(CorrelationError::DimensionMismatch { .. })
        ));
    }
}

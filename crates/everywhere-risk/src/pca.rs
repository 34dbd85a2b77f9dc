//! Principal components of strided column groups.
//!
//! The covariance matrix of the selected columns is estimated pairwise over the
//! available data. Principal directions are then extracted in one of two ways:
//!
//! - [`PcaBasis::CovarianceRows`] treats the covariance matrix itself as a data
//!   matrix (each row an observation), centres its columns and decomposes the
//!   resulting sample covariance. This reproduces the procedure used for the
//!   published loadings.
//! - [`PcaBasis::Covariance`] decomposes the covariance matrix directly.
//!
//! Loadings are unit-norm; the sign is fixed so the largest-magnitude loading
//! is positive.

use crate::eigen::{EigenError, symmetric_eigen};
use crate::stats::pairwise_covariance;
use everywhere_data::{ColumnSelection, PanelError, ReturnPanel};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// PCA errors
#[derive(Debug, Error)]
pub enum PcaError {
    /// Fewer than two columns selected
    #[error("PCA needs at least 2 columns, got {found}")]
    InsufficientColumns {
        /// Number of selected columns
        found: usize,
    },

    /// Some pair of columns has fewer than two common observations
    #[error("Covariance between {left} and {right} is undefined")]
    UndefinedCovariance {
        /// First column label
        left: String,
        /// Second column label
        right: String,
    },

    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Column selection error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Decomposition error
    #[error("Eigendecomposition error: {0}")]
    Eigen(#[from] EigenError),
}

/// Matrix the principal directions are extracted from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcaBasis {
    /// Rows of the covariance matrix as observations
    #[default]
    CovarianceRows,
    /// The covariance matrix itself
    Covariance,
}

/// PCA configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaConfig {
    /// Decomposition basis (default: covariance rows)
    pub basis: PcaBasis,
    /// Maximum Jacobi sweeps (default: 100)
    pub max_sweeps: usize,
    /// Off-diagonal convergence tolerance (default: 1e-12)
    pub tolerance: f64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            basis: PcaBasis::default(),
            max_sweeps: 100,
            tolerance: 1e-12,
        }
    }
}

/// One principal component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalComponent {
    /// Labels of the selected columns, in loading order
    pub columns: Vec<String>,
    /// Unit-norm loading vector
    pub loadings: Array1<f64>,
    /// Variance along this direction
    pub explained_variance: f64,
    /// Share of total variance, `NaN` when the total is zero
    pub explained_variance_ratio: f64,
}

/// Extracts principal components from panel column groups
#[derive(Debug, Clone)]
pub struct PcaReducer {
    config: PcaConfig,
}

impl PcaReducer {
    /// Create a new reducer
    pub fn new(config: PcaConfig) -> Result<Self, PcaError> {
        if config.max_sweeps == 0 {
            return Err(PcaError::InvalidParameter(
                "max_sweeps must be positive".to_string(),
            ));
        }
        if config.tolerance.is_nan() || config.tolerance <= 0.0 {
            return Err(PcaError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                config.tolerance
            )));
        }
        Ok(Self { config })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not happen).
    pub fn try_default() -> Result<Self, PcaError> {
        Self::new(PcaConfig::default())
    }

    /// First principal component of the selected columns
    pub fn first_component(
        &self,
        panel: &ReturnPanel,
        selection: &ColumnSelection,
    ) -> Result<PrincipalComponent, PcaError> {
        let mut components = self.components(panel, selection)?;
        // components() always yields one entry per selected column (>= 2)
        Ok(components.swap_remove(0))
    }

    /// All principal components of the selected columns, by decreasing variance
    pub fn components(
        &self,
        panel: &ReturnPanel,
        selection: &ColumnSelection,
    ) -> Result<Vec<PrincipalComponent>, PcaError> {
        let indices = selection.indices()?;
        let sub = panel.select_columns(&indices)?;
        if sub.width() < 2 {
            return Err(PcaError::InsufficientColumns { found: sub.width() });
        }

        let cov = pairwise_covariance(sub.values());
        if let Some(((i, j), _)) = cov.indexed_iter().find(|(_, v)| v.is_nan()) {
            return Err(PcaError::UndefinedCovariance {
                left: sub.columns()[i].clone(),
                right: sub.columns()[j].clone(),
            });
        }

        debug!(columns = ?sub.columns(), basis = ?self.config.basis, "fitting principal components");
        self.fit_covariance(&cov, sub.columns())
    }

    /// Principal components of an already estimated covariance matrix
    pub fn fit_covariance(
        &self,
        cov: &Array2<f64>,
        columns: &[String],
    ) -> Result<Vec<PrincipalComponent>, PcaError> {
        let k = cov.nrows();
        if k < 2 {
            return Err(PcaError::InsufficientColumns { found: k });
        }

        let target = match self.config.basis {
            PcaBasis::Covariance => cov.clone(),
            PcaBasis::CovarianceRows => {
                let means = cov.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(k));
                let centred = cov - &means;
                centred.t().dot(&centred) / (k - 1) as f64
            }
        };

        let decomp = symmetric_eigen(&target, self.config.max_sweeps, self.config.tolerance)?;
        let total: f64 = decomp.eigenvalues.sum();
        if total <= 0.0 {
            warn!(columns = ?columns, "total variance is zero; components are arbitrary");
        }

        let components = decomp
            .eigenvalues
            .iter()
            .zip(decomp.eigenvectors.columns())
            .map(|(&variance, vector)| {
                let mut loadings = vector.to_owned();
                orient(&mut loadings);
                PrincipalComponent {
                    columns: columns.to_vec(),
                    loadings,
                    explained_variance: variance,
                    explained_variance_ratio: if total > 0.0 {
                        variance / total
                    } else {
                        f64::NAN
                    },
                }
            })
            .collect();
        Ok(components)
    }
}

/// Unit norm, largest-magnitude entry positive.
fn orient(loadings: &mut Array1<f64>) {
    let norm = loadings.dot(loadings).sqrt();
    if norm > 0.0 {
        *loadings /= norm;
    }
    let pivot = loadings
        .iter()
        .copied()
        .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        loadings.mapv_inplace(|x| -x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use everywhere_data::PeriodKey;
    use ndarray::array;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    fn panel(columns: Vec<Vec<f64>>) -> ReturnPanel {
        let n = columns[0].len();
        let periods = (0..n)
            .map(|i| PeriodKey::from_ymd(2015, i as u32 + 1).unwrap())
            .collect();
        ReturnPanel::from_columns(periods, labels(columns.len()).into_iter().zip(columns).collect())
            .unwrap()
    }

    #[test]
    fn test_invalid_config() {
        let config = PcaConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(PcaReducer::new(config).is_err());
        let config = PcaConfig {
            max_sweeps: 0,
            ..Default::default()
        };
        assert!(PcaReducer::new(config).is_err());
    }

    #[test]
    fn test_covariance_basis_correlated_pair() {
        let reducer = PcaReducer::new(PcaConfig {
            basis: PcaBasis::Covariance,
            ..Default::default()
        })
        .unwrap();
        let x = vec![0.01, -0.02, 0.03, 0.00, 0.02, -0.01];
        let p = panel(vec![x.clone(), x]);

        let pc = reducer
            .first_component(&p, &ColumnSelection::strided(0, 2, 1))
            .unwrap();
        let h = 1.0 / 2.0_f64.sqrt();
        assert_abs_diff_eq!(pc.loadings[0], h, epsilon = 1e-10);
        assert_abs_diff_eq!(pc.loadings[1], h, epsilon = 1e-10);
        assert_abs_diff_eq!(pc.explained_variance_ratio, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_covariance_rows_basis() {
        let reducer = PcaReducer::try_default().unwrap();
        let cov = array![[2.0, -2.0, 0.0], [-2.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
        let components = reducer.fit_covariance(&cov, &labels(3)).unwrap();

        assert_eq!(components.len(), 3);
        let first = &components[0];
        let h = 1.0 / 2.0_f64.sqrt();
        assert_abs_diff_eq!(first.loadings[0].abs(), h, epsilon = 1e-10);
        assert_abs_diff_eq!(first.loadings[0], -first.loadings[1], epsilon = 1e-10);
        assert_abs_diff_eq!(first.loadings[2], 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(first.explained_variance, 8.0, epsilon = 1e-10);
        assert_abs_diff_eq!(first.explained_variance_ratio, 0.96, epsilon = 1e-10);
    }

    #[test]
    fn test_loadings_unit_norm_and_oriented() {
        let reducer = PcaReducer::try_default().unwrap();
        let p = panel(vec![
            vec![0.01, -0.02, 0.03, 0.01, 0.02, -0.01, 0.00, 0.04],
            vec![0.02, -0.01, 0.01, 0.03, -0.02, 0.02, 0.01, 0.00],
            vec![-0.01, 0.02, 0.03, -0.02, 0.01, 0.04, 0.02, -0.03],
            vec![0.00, 0.01, -0.01, 0.02, 0.03, -0.02, 0.01, 0.02],
        ]);
        let pc = reducer
            .first_component(&p, &ColumnSelection::strided(0, 2, 2))
            .unwrap();

        assert_eq!(pc.columns, vec!["c0".to_string(), "c2".to_string()]);
        assert_abs_diff_eq!(pc.loadings.dot(&pc.loadings), 1.0, epsilon = 1e-10);
        let pivot = pc
            .loadings
            .iter()
            .copied()
            .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
        assert!(pivot > 0.0);
    }

    #[test]
    fn test_single_column_rejected() {
        let reducer = PcaReducer::try_default().unwrap();
        let p = panel(vec![vec![0.01, 0.02, 0.03]]);
        assert!(matches!(
            reducer.first_component(&p, &ColumnSelection::single(0)),
            Err(PcaError::InsufficientColumns { found: 1 })
        ));
    }

    #[test]
    fn test_out_of_range_selection() {
        let reducer = PcaReducer::try_default().unwrap();
        let p = panel(vec![vec![0.01, 0.02], vec![0.03, 0.01]]);
        assert!(matches!(
            reducer.first_component(&p, &ColumnSelection::strided(0, 2, 5)),
            Err(PcaError::Panel(PanelError::ColumnOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_undefined_covariance() {
        let reducer = PcaReducer::try_default().unwrap();
        let p = panel(vec![
            vec![0.01, 0.02, f64::NAN, f64::NAN],
            vec![f64::NAN, f64::NAN, 0.03, 0.01],
        ]);
        assert!(matches!(
            reducer.first_component(&p, &ColumnSelection::strided(0, 2, 1)),
            Err(PcaError::UndefinedCovariance { .. })
        ));
    }
}

//! Volatility-proportional weighting
//!
//! Each asset's weight at period t is its trailing standard deviation over
//! `roll_window` periods divided by the sum of those standard deviations across
//! the portfolio:
//!
//! w_{i,t} = σ_{i,t} / Σ_j σ_{j,t}
//!
//! so the more volatile assets carry the larger weights. Weighted returns are
//! r_{i,t} * w_{i,t}. A standard deviation needs a full window of observations,
//! so the first `roll_window - 1` periods of every weight are missing. The
//! portfolio total needs at least `min_count` defined standard deviations in
//! the row.

use crate::error::{Result, WeightingError};
use everywhere_data::{
    ReturnPanel, frame_to_values, row_sum_min_count, value_column_name, values_to_frame,
};
use ndarray::{Array2, ArrayView2, Zip};
use polars::prelude::{Expr, IntoLazy, RollingOptionsFixedWindow, col};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Volatility weighting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityWeightingConfig {
    /// Rolling window in periods; also the minimum number of observations
    /// (default: 36)
    pub roll_window: usize,

    /// Minimum number of defined asset volatilities in a row for the
    /// portfolio total to be defined (default: 1)
    pub min_count: usize,
}

impl Default for VolatilityWeightingConfig {
    fn default() -> Self {
        Self {
            roll_window: 36,
            min_count: 1,
        }
    }
}

/// Trailing sample standard deviation of every column.
///
/// Entry (t, j) is defined only when rows `t + 1 - window ..= t` of column j
/// are all present; anything else is `NaN`.
pub fn rolling_std(values: ArrayView2<'_, f64>, window: usize) -> Result<Array2<f64>> {
    if window < 2 || values.ncols() == 0 {
        return Ok(Array2::from_elem(values.dim(), f64::NAN));
    }

    // ddof defaults to 1
    let options = RollingOptionsFixedWindow {
        window_size: window,
        min_periods: window,
        ..Default::default()
    };
    let stds: Vec<Expr> = (0..values.ncols())
        .map(|j| col(value_column_name(j)).rolling_std(options.clone()))
        .collect();

    let frame = values_to_frame(values)?.lazy().select(stds).collect()?;
    Ok(frame_to_values(&frame)?)
}

/// Volatility weighter
#[derive(Debug, Clone)]
pub struct VolatilityWeighter {
    config: VolatilityWeightingConfig,
}

impl VolatilityWeighter {
    /// Create a new weighter with the given configuration
    pub fn new(config: VolatilityWeightingConfig) -> Result<Self> {
        if config.roll_window < 2 {
            return Err(WeightingError::InvalidParameter(format!(
                "roll_window must be at least 2, got {}",
                config.roll_window
            )));
        }
        Ok(Self { config })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not happen).
    pub fn try_default() -> Result<Self> {
        Self::new(VolatilityWeightingConfig::default())
    }

    /// Configuration in use
    pub const fn config(&self) -> &VolatilityWeightingConfig {
        &self.config
    }

    /// Rolling standard deviation of every asset
    pub fn volatilities(&self, returns: &ReturnPanel) -> Result<Array2<f64>> {
        rolling_std(returns.values().view(), self.config.roll_window)
    }

    /// Normalised weights, same shape as `returns`
    pub fn weights(&self, returns: &ReturnPanel) -> Result<ReturnPanel> {
        let mut vols = self.volatilities(returns)?;
        let total = row_sum_min_count(&vols, self.config.min_count);

        let zero_rows = total.iter().filter(|&&t| t == 0.0).count();
        if zero_rows > 0 {
            warn!(
                rows = zero_rows,
                columns = ?returns.columns(),
                "volatility total is zero; weights left undefined"
            );
        }

        for (mut row, &t) in vols.rows_mut().into_iter().zip(total.iter()) {
            if t.is_nan() || t == 0.0 {
                row.fill(f64::NAN);
            } else {
                row.mapv_inplace(|v| v / t);
            }
        }

        Ok(returns.with_values(returns.columns().to_vec(), vols)?)
    }

    /// Weighted returns for one portfolio
    pub fn weight(&self, returns: &ReturnPanel) -> Result<ReturnPanel> {
        let weights = self.weights(returns)?;
        let mut weighted = Array2::<f64>::zeros(returns.values().dim());
        Zip::from(&mut weighted)
            .and(returns.values())
            .and(weights.values())
            .for_each(|out, &r, &w| *out = r * w);

        debug!(
            columns = ?returns.columns(),
            periods = returns.n_periods(),
            roll_window = self.config.roll_window,
            "weighted portfolio returns"
        );
        Ok(returns.with_values(returns.columns().to_vec(), weighted)?)
    }

    /// Weighted returns for every supplied portfolio
    pub fn weight_all(&self, portfolios: &[ReturnPanel]) -> Result<Vec<ReturnPanel>> {
        portfolios.iter().map(|p| self.weight(p)).collect()
    }
}

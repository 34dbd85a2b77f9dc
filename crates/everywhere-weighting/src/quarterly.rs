//! Quarterly aggregation of volatility-weighted portfolio returns.
//!
//! Monthly weighted returns are summed per asset within each calendar quarter
//! and then across the assets of the portfolio. Quarter keys are taken from the
//! first portfolio's index; every other portfolio must share it.
//!
//! Per-asset sums skip missing months, so a quarter with no data sums to zero.
//! With `ignore_nan` those zeros (and any genuine net-zero quarter, which is
//! indistinguishable) are treated as missing. The final sum across assets does
//! not skip missing values: one missing asset makes the portfolio quarter missing.

use crate::error::{Result, WeightingError};
use crate::volatility::{VolatilityWeighter, VolatilityWeightingConfig};
use everywhere_data::{QuarterlySeries, ReturnPanel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Quarterly aggregation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyConfig {
    /// Weighting applied to raw returns before aggregation
    #[serde(default)]
    pub weighting: VolatilityWeightingConfig,

    /// Treat quarterly per-asset sums of exactly zero as missing (default: true)
    #[serde(default = "default_ignore_nan")]
    pub ignore_nan: bool,
}

const fn default_ignore_nan() -> bool {
    true
}

impl Default for QuarterlyConfig {
    fn default() -> Self {
        Self {
            weighting: VolatilityWeightingConfig::default(),
            ignore_nan: true,
        }
    }
}

/// Aggregates portfolio returns to quarterly series
#[derive(Debug, Clone)]
pub struct QuarterlyAggregator {
    weighter: VolatilityWeighter,
    ignore_nan: bool,
}

impl QuarterlyAggregator {
    /// Create a new aggregator
    pub fn new(config: QuarterlyConfig) -> Result<Self> {
        Ok(Self {
            weighter: VolatilityWeighter::new(config.weighting)?,
            ignore_nan: config.ignore_nan,
        })
    }

    /// Weighter used for raw inputs
    pub const fn weighter(&self) -> &VolatilityWeighter {
        &self.weighter
    }

    /// Volatility-weight raw portfolio returns, then aggregate them.
    pub fn aggregate(&self, raw: &[ReturnPanel]) -> Result<Vec<QuarterlySeries>> {
        let weighted = self.weighter.weight_all(raw)?;
        self.aggregate_weighted(&weighted)
    }

    /// Aggregate returns that are already weighted.
    pub fn aggregate_weighted(&self, weighted: &[ReturnPanel]) -> Result<Vec<QuarterlySeries>> {
        let Some(first) = weighted.first() else {
            return Ok(Vec::new());
        };
        if let Some(portfolio) = weighted.iter().position(|p| !p.same_index(first)) {
            return Err(WeightingError::IndexMismatch { portfolio });
        }

        let series = weighted
            .iter()
            .map(|p| Ok(p.resample_quarterly(self.ignore_nan)?.row_sums_strict()))
            .collect::<Result<Vec<QuarterlySeries>>>()?;

        for (i, s) in series.iter().enumerate() {
            let defined = s.count_defined();
            if defined == 0 {
                warn!(portfolio = i, "quarterly series has no defined values");
            }
            debug!(
                portfolio = i,
                quarters = s.quarters().len(),
                defined,
                ignore_nan = self.ignore_nan,
                "aggregated quarterly returns"
            );
        }
        Ok(series)
    }
}

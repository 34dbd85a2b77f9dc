//! Return panels and their quarterly resamplings.
//!
//! A [`ReturnPanel`] is a table of period returns: rows are monthly periods in
//! non-decreasing order, columns are assets, values are returns. Missing
//! observations are stored as `NaN`.

use crate::error::{PanelError, Result};
use crate::frame::{frame_to_values, value_column_name, values_to_frame};
use crate::period::{PeriodKey, QuarterKey};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use polars::prelude::{IntoLazy, NamedFrom, Series, col};
use serde::{Deserialize, Serialize};

const QUARTER_COLUMN: &str = "quarter";

/// A date-indexed table of asset returns.
///
/// Deserialization goes through [`ReturnPanel::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPanel")]
pub struct ReturnPanel {
    periods: Vec<PeriodKey>,
    columns: Vec<String>,
    values: Array2<f64>,
}

#[derive(Deserialize)]
struct RawPanel {
    periods: Vec<PeriodKey>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl TryFrom<RawPanel> for ReturnPanel {
    type Error = PanelError;

    fn try_from(raw: RawPanel) -> Result<Self> {
        Self::new(raw.periods, raw.columns, raw.values)
    }
}

impl ReturnPanel {
    /// Create a panel, checking the shape and the ordering of the index.
    pub fn new(periods: Vec<PeriodKey>, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != periods.len() || cols != columns.len() {
            return Err(PanelError::ShapeMismatch {
                expected_rows: periods.len(),
                expected_cols: columns.len(),
                rows,
                cols,
            });
        }
        if let Some(row) = periods.windows(2).position(|w| w[1] < w[0]) {
            return Err(PanelError::NonMonotonicIndex {
                row: row + 1,
                previous: periods[row].value(),
                current: periods[row + 1].value(),
            });
        }
        Ok(Self {
            periods,
            columns,
            values,
        })
    }

    /// Build a panel from per-column value vectors.
    pub fn from_columns(periods: Vec<PeriodKey>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let rows = periods.len();
        let mut values = Array2::<f64>::from_elem((rows, columns.len()), f64::NAN);
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, data)) in columns.into_iter().enumerate() {
            if data.len() != rows {
                return Err(PanelError::ShapeMismatch {
                    expected_rows: rows,
                    expected_cols: 1,
                    rows: data.len(),
                    cols: 1,
                });
            }
            values.column_mut(j).assign(&Array1::from_vec(data));
            names.push(name);
        }
        Self::new(periods, names, values)
    }

    /// Period index.
    pub fn periods(&self) -> &[PeriodKey] {
        &self.periods
    }

    /// Column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return values (rows = periods, columns = assets).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of periods.
    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    /// Number of value columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// View of a single column by position.
    pub fn column(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        if index >= self.width() {
            return Err(PanelError::ColumnOutOfRange {
                index,
                width: self.width(),
            });
        }
        Ok(self.values.column(index))
    }

    /// Returns a new panel holding the columns at `indices`, in that order.
    pub fn select_columns(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.width()) {
            return Err(PanelError::ColumnOutOfRange {
                index,
                width: self.width(),
            });
        }
        Ok(Self {
            periods: self.periods.clone(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            values: self.values.select(Axis(1), indices),
        })
    }

    /// Same index, new values and labels.
    pub fn with_values(&self, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        Self::new(self.periods.clone(), columns, values)
    }

    /// Whether two panels share the same period index.
    pub fn same_index(&self, other: &Self) -> bool {
        self.periods == other.periods
    }

    /// Row-wise sum over non-missing values, or `NaN` when fewer than
    /// `min_count` values are present in the row.
    pub fn row_sum_min_count(&self, min_count: usize) -> Array1<f64> {
        row_sum_min_count(&self.values, min_count)
    }

    /// Sum each asset's returns within calendar quarters.
    ///
    /// Missing values are skipped, so a quarter with no observations sums to
    /// zero. With `zero_as_missing` every quarterly sum exactly equal to `0.0`
    /// becomes `NaN`. This separates "no data" from a quarter with data, at the
    /// cost of also discarding genuine net-zero quarters.
    pub fn resample_quarterly(&self, zero_as_missing: bool) -> Result<QuarterlyPanel> {
        if self.width() == 0 {
            let mut quarters: Vec<QuarterKey> = self.periods.iter().map(|p| p.quarter()).collect();
            quarters.dedup();
            let values = Array2::zeros((quarters.len(), 0));
            return Ok(QuarterlyPanel {
                quarters,
                columns: Vec::new(),
                values,
            });
        }

        let ordinals: Vec<i64> = self.periods.iter().map(|p| p.quarter().ordinal()).collect();
        let mut frame = values_to_frame(self.values.view())?;
        frame.with_column(Series::new(QUARTER_COLUMN.into(), ordinals))?;

        // polars sums an all-null group to zero
        let sums: Vec<_> = (0..self.width())
            .map(|j| col(value_column_name(j)).sum())
            .collect();
        let grouped = frame
            .lazy()
            .group_by_stable([col(QUARTER_COLUMN)])
            .agg(sums)
            .sort([QUARTER_COLUMN], Default::default())
            .collect()?;

        let quarters = grouped
            .column(QUARTER_COLUMN)?
            .i64()?
            .into_no_null_iter()
            .map(QuarterKey::from_ordinal)
            .collect::<Result<Vec<_>>>()?;
        let mut values = frame_to_values(&grouped.drop(QUARTER_COLUMN)?)?;
        if zero_as_missing {
            values.mapv_inplace(|v| if v == 0.0 { f64::NAN } else { v });
        }

        Ok(QuarterlyPanel {
            quarters,
            columns: self.columns.clone(),
            values,
        })
    }
}

/// Row-wise sum over non-missing values with a minimum count.
pub fn row_sum_min_count(values: &Array2<f64>, min_count: usize) -> Array1<f64> {
    values.map_axis(Axis(1), |row| {
        let (sum, count) = row
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
        if count < min_count { f64::NAN } else { sum }
    })
}

/// Per-asset quarterly sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyPanel {
    quarters: Vec<QuarterKey>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl QuarterlyPanel {
    /// Quarter index in chronological order.
    pub fn quarters(&self) -> &[QuarterKey] {
        &self.quarters
    }

    /// Column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Quarterly values (rows = quarters, columns = assets).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Sum across assets per quarter; any missing asset makes the quarter missing.
    pub fn row_sums_strict(&self) -> QuarterlySeries {
        let values = self.values.map_axis(Axis(1), |row| row.sum());
        QuarterlySeries {
            quarters: self.quarters.clone(),
            values,
        }
    }
}

/// A single quarterly return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlySeries {
    quarters: Vec<QuarterKey>,
    values: Array1<f64>,
}

impl QuarterlySeries {
    /// Create a series from aligned quarters and values.
    pub fn new(quarters: Vec<QuarterKey>, values: Vec<f64>) -> Result<Self> {
        if quarters.len() != values.len() {
            return Err(PanelError::ShapeMismatch {
                expected_rows: quarters.len(),
                expected_cols: 1,
                rows: values.len(),
                cols: 1,
            });
        }
        Ok(Self {
            quarters,
            values: Array1::from_vec(values),
        })
    }

    /// Quarter index.
    pub fn quarters(&self) -> &[QuarterKey] {
        &self.quarters
    }

    /// Values, `NaN` where missing.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Value for a quarter, `None` if absent or missing.
    pub fn get(&self, quarter: &QuarterKey) -> Option<f64> {
        self.quarters
            .iter()
            .position(|q| q == quarter)
            .map(|i| self.values[i])
            .filter(|v| !v.is_nan())
    }

    /// Iterate `(quarter, value)` pairs that are not missing.
    pub fn iter_defined(&self) -> impl Iterator<Item = (QuarterKey, f64)> + '_ {
        self.quarters
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .filter(|(_, v)| !v.is_nan())
    }

    /// Number of non-missing quarters.
    pub fn count_defined(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

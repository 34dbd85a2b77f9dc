//! Conversion from polars frames and CSV files into return panels.
//!
//! The date column may hold `YYYYMMDD` integers (day granularity is stripped),
//! `YYYYMM` integers, or polars `Date`/`Datetime` values. All other columns are
//! cast to `f64`; nulls become `NaN`.

use crate::error::{PanelError, Result};
use crate::panel::ReturnPanel;
use crate::period::PeriodKey;
use ndarray::{Array2, ArrayView2};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

impl ReturnPanel {
    /// Build a panel from a frame, consuming `date_column` as the period index.
    ///
    /// The frame is not modified; the date column is simply left out of the
    /// value columns.
    pub fn from_dataframe(frame: &DataFrame, date_column: &str) -> Result<Self> {
        let names: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        if !names.iter().any(|name| name == date_column) {
            return Err(PanelError::MissingDateColumn(date_column.to_string()));
        }

        let periods = period_index(frame.column(date_column)?, date_column)?;

        let value_names: Vec<String> = names.into_iter().filter(|n| n != date_column).collect();
        let mut values = Array2::<f64>::from_elem((frame.height(), value_names.len()), f64::NAN);
        for (j, name) in value_names.iter().enumerate() {
            let cast = frame.column(name)?.cast(&DataType::Float64)?;
            for (i, v) in cast.f64()?.into_iter().enumerate() {
                values[[i, j]] = v.unwrap_or(f64::NAN);
            }
        }

        debug!(
            rows = frame.height(),
            columns = value_names.len(),
            date_column,
            "loaded return panel"
        );
        Self::new(periods, value_names, values)
    }

    /// Read a CSV file with a header row into a panel.
    pub fn read_csv(path: impl AsRef<Path>, date_column: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PanelError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("panel file not found: {}", path.display()),
            )));
        }
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Self::from_dataframe(&frame, date_column)
    }
}

/// Name given to matrix column `j` when values pass through a polars frame.
pub fn value_column_name(j: usize) -> String {
    format!("v{j}")
}

/// One `Float64` column per matrix column, named by [`value_column_name`].
/// `NaN` becomes null so polars' missing-value handling applies.
pub fn values_to_frame(values: ArrayView2<'_, f64>) -> Result<DataFrame> {
    let columns: Vec<Column> = values
        .columns()
        .into_iter()
        .enumerate()
        .map(|(j, column)| {
            let data: Vec<Option<f64>> = column
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect();
            Series::new(value_column_name(j).into(), data).into()
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Every column of `frame` cast to `f64`, nulls mapped back to `NaN`.
pub fn frame_to_values(frame: &DataFrame) -> Result<Array2<f64>> {
    let mut values = Array2::<f64>::from_elem((frame.height(), frame.width()), f64::NAN);
    for (j, column) in frame.get_columns().iter().enumerate() {
        let cast = column.cast(&DataType::Float64)?;
        for (i, v) in cast.f64()?.into_iter().enumerate() {
            values[[i, j]] = v.unwrap_or(f64::NAN);
        }
    }
    Ok(values)
}

fn period_index(column: &Column, name: &str) -> Result<Vec<PeriodKey>> {
    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let dates = column.cast(&DataType::Date)?;
            dates
                .date()?
                .as_date_iter()
                .enumerate()
                .map(|(row, date)| {
                    date.ok_or(PanelError::NullDate { row })
                        .and_then(PeriodKey::from_date)
                })
                .collect()
        }
        dtype if dtype.is_integer() || dtype.is_float() || dtype == &DataType::String => {
            let ints = column.cast(&DataType::Int64)?;
            ints.i64()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.ok_or(PanelError::NullDate { row })?;
                    // Month-level keys pass through unchanged
                    if (100_000..1_000_000).contains(&value) {
                        let key = u32::try_from(value)
                            .map_err(|_| PanelError::InvalidPeriodKey(value))?;
                        PeriodKey::new(key)
                    } else {
                        PeriodKey::from_date_value(value)
                    }
                })
                .collect()
        }
        dtype => Err(PanelError::UnsupportedDateType {
            column: name.to_string(),
            dtype: dtype.to_string(),
        }),
    }
}

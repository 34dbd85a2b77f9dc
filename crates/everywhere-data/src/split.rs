//! Portfolio splitting by positional column groups.
//!
//! Source panels lay related strategies out at fixed offsets (for example the
//! value leg of every asset class followed by the momentum legs). A portfolio is
//! addressed by its first column, the number of columns in the group and the
//! stride between them.

use crate::error::{PanelError, Result};
use crate::panel::ReturnPanel;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Columns `start, start + stride, ..., start + (group_size - 1) * stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    /// Position of the first column
    pub start: usize,
    /// Number of columns in the group
    pub group_size: usize,
    /// Distance between consecutive columns; required when `group_size > 1`
    pub stride: Option<usize>,
}

impl ColumnSelection {
    /// A single column.
    pub const fn single(start: usize) -> Self {
        Self {
            start,
            group_size: 1,
            stride: None,
        }
    }

    /// A strided group of columns.
    pub const fn strided(start: usize, group_size: usize, stride: usize) -> Self {
        Self {
            start,
            group_size,
            stride: Some(stride),
        }
    }

    /// Resolve the column positions.
    pub fn indices(&self) -> Result<Vec<usize>> {
        match (self.group_size, self.stride) {
            (0, _) => Err(PanelError::InvalidSelection(
                "group size must be at least 1".to_string(),
            )),
            (1, _) => Ok(vec![self.start]),
            (_, None) => Err(PanelError::InvalidSelection(format!(
                "group of {} columns starting at {} needs a stride",
                self.group_size, self.start
            ))),
            (n, Some(stride)) => (0..n)
                .map(|k| {
                    k.checked_mul(stride)
                        .and_then(|offset| offset.checked_add(self.start))
                        .ok_or_else(|| {
                            PanelError::InvalidSelection(format!(
                                "column {k} of the group starting at {} with stride {stride} \
                                 overflows the column index",
                                self.start
                            ))
                        })
                })
                .collect(),
        }
    }
}

/// Shared group shape applied to several starting columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioLayout {
    /// First column of each portfolio
    pub starts: Vec<usize>,
    /// Columns per portfolio
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    /// Distance between columns of one portfolio
    #[serde(default)]
    pub stride: Option<usize>,
}

const fn default_group_size() -> usize {
    1
}

impl PortfolioLayout {
    /// One single-column portfolio per start.
    pub const fn singles(starts: Vec<usize>) -> Self {
        Self {
            starts,
            group_size: 1,
            stride: None,
        }
    }

    /// One strided group per start.
    pub const fn grouped(starts: Vec<usize>, group_size: usize, stride: usize) -> Self {
        Self {
            starts,
            group_size,
            stride: Some(stride),
        }
    }

    /// Selection for each portfolio.
    pub fn selections(&self) -> Vec<ColumnSelection> {
        self.starts
            .iter()
            .map(|&start| ColumnSelection {
                start,
                group_size: self.group_size,
                stride: self.stride,
            })
            .collect()
    }
}

/// Splits a flat panel into per-portfolio sub-panels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelSplitter;

impl PanelSplitter {
    /// One sub-panel per selection. The source panel is left untouched.
    pub fn split(panel: &ReturnPanel, selections: &[ColumnSelection]) -> Result<Vec<ReturnPanel>> {
        selections
            .iter()
            .map(|selection| {
                let indices = selection.indices()?;
                let sub = panel.select_columns(&indices)?;
                debug!(
                    start = selection.start,
                    columns = ?sub.columns(),
                    "split portfolio"
                );
                Ok(sub)
            })
            .collect()
    }

    /// Split using a shared layout.
    pub fn split_layout(panel: &ReturnPanel, layout: &PortfolioLayout) -> Result<Vec<ReturnPanel>> {
        Self::split(panel, &layout.selections())
    }

    /// Consume `date_column` of a raw frame as the period index and split the
    /// remaining columns.
    pub fn split_frame(
        frame: &DataFrame,
        date_column: &str,
        layout: &PortfolioLayout,
    ) -> Result<Vec<ReturnPanel>> {
        let panel = ReturnPanel::from_dataframe(frame, date_column)?;
        Self::split_layout(&panel, layout)
    }
}

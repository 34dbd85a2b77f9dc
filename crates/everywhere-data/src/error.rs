//! Error types for panel operations.

use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that can occur while building or slicing return panels.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Column position outside the panel
    #[error("Column index {index} out of range for panel with {width} columns")]
    ColumnOutOfRange {
        /// Requested column position
        index: usize,
        /// Number of value columns in the panel
        width: usize,
    },

    /// Date column absent from the source frame
    #[error("Date column not found: {0}")]
    MissingDateColumn(String),

    /// Date value that does not map to a valid YYYYMM key
    #[error("Invalid period key: {0}")]
    InvalidPeriodKey(i64),

    /// Null in the date column
    #[error("Null date in row {row}")]
    NullDate {
        /// Row with the missing date
        row: usize,
    },

    /// Quarter label that does not parse as YYYYQn
    #[error("Invalid quarter key: {0}")]
    InvalidQuarterKey(String),

    /// Periods must be non-decreasing
    #[error("Period index is not monotonic at row {row}: {previous} followed by {current}")]
    NonMonotonicIndex {
        /// Row at which the ordering breaks
        row: usize,
        /// Key of the previous row
        previous: u32,
        /// Key of the offending row
        current: u32,
    },

    /// Shape of the values does not match the index and column labels
    #[error("Shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        /// Expected row count
        expected_rows: usize,
        /// Expected column count
        expected_cols: usize,
        /// Actual row count
        rows: usize,
        /// Actual column count
        cols: usize,
    },

    /// Malformed column selection
    #[error("Invalid column selection: {0}")]
    InvalidSelection(String),

    /// Unsupported dtype for the date column
    #[error("Unsupported date column type {dtype} for column {column}")]
    UnsupportedDateType {
        /// Column name
        column: String,
        /// Polars dtype rendered as text
        dtype: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

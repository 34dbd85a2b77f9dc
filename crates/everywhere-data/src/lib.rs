#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/everywhere/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod panel;
pub mod period;
pub mod split;

pub use error::{PanelError, Result};
pub use frame::{frame_to_values, value_column_name, values_to_frame};
pub use panel::{QuarterlyPanel, QuarterlySeries, ReturnPanel, row_sum_min_count};
pub use period::{PeriodKey, QuarterKey, quarter_key};
pub use split::{ColumnSelection, PanelSplitter, PortfolioLayout};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

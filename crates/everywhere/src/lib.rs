#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/everywhere/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod error;

// Re-export main types from sub-crates
pub use everywhere_data as data;
pub use everywhere_output as output;
pub use everywhere_risk as risk;
pub use everywhere_weighting as weighting;

pub use analysis::{Analysis, AnalysisReport};
pub use config::{AnalysisConfig, PcaSettings};
pub use error::{AnalysisError, Result};

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

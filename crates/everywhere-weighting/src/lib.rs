#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/everywhere/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod quarterly;
pub mod volatility;

pub use error::{Result, WeightingError};
pub use quarterly::{QuarterlyAggregator, QuarterlyConfig};
pub use volatility::{VolatilityWeighter, VolatilityWeightingConfig, rolling_std};

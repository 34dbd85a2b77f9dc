#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/everywhere/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod correlation;
pub mod eigen;
pub mod pca;
pub mod stats;

// Re-export main types
pub use correlation::{CorrelationAnalyzer, CorrelationConfig, CorrelationError, CorrelationMatrix};
pub use eigen::{EigenDecomposition, EigenError, symmetric_eigen};
pub use pca::{PcaBasis, PcaConfig, PcaError, PcaReducer, PrincipalComponent};

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/everywhere/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod table;

pub use export::{ExportError, ExportFormat, Exporter, QuarterlyExport};
pub use report::{Report, ReportError};
pub use table::{component_table, correlation_table, quarterly_table};

//! CSV and JSON export of analysis results.
//!
//! Missing values are written as empty CSV fields and as JSON `null`.

use everywhere_data::QuarterlySeries;
use everywhere_risk::{CorrelationMatrix, PrincipalComponent};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Labels and series of different lengths.
    #[error("Got {labels} labels for {series} series")]
    LabelMismatch {
        /// Number of labels
        labels: usize,
        /// Number of series
        series: usize,
    },
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data to various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn json<T: Serialize>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::PrettyJson => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Serializable view of a correlation matrix.
#[derive(Debug, Serialize, Deserialize)]
struct CorrelationRecord {
    labels: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl Exporter for CorrelationMatrix {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec![String::new()];
                header.extend(self.labels().iter().cloned());
                wtr.write_record(&header)?;
                for (label, row) in self.labels().iter().zip(self.to_rows()) {
                    let mut record = vec![label.clone()];
                    record.extend(row.into_iter().map(cell));
                    wtr.write_record(&record)?;
                }
                finish(wtr)
            }
            _ => json(
                &CorrelationRecord {
                    labels: self.labels().to_vec(),
                    values: self.to_rows(),
                },
                format,
            ),
        }
    }
}

/// Flattened loading for CSV export.
#[derive(Debug, Serialize, Deserialize)]
struct LoadingRecord {
    component: usize,
    column: String,
    loading: f64,
    explained_variance_ratio: f64,
}

fn loading_records(index: usize, pc: &PrincipalComponent) -> Vec<LoadingRecord> {
    pc.columns
        .iter()
        .zip(pc.loadings.iter())
        .map(|(column, &loading)| LoadingRecord {
            component: index + 1,
            column: column.clone(),
            loading,
            explained_variance_ratio: pc.explained_variance_ratio,
        })
        .collect()
}

impl Exporter for PrincipalComponent {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in loading_records(0, self) {
                    wtr.serialize(&record)?;
                }
                finish(wtr)
            }
            _ => json(self, format),
        }
    }
}

impl Exporter for Vec<PrincipalComponent> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for (i, pc) in self.iter().enumerate() {
                    for record in loading_records(i, pc) {
                        wtr.serialize(&record)?;
                    }
                }
                finish(wtr)
            }
            _ => json(self, format),
        }
    }
}

/// Labelled quarterly series sharing one quarter index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyExport {
    /// Portfolio labels
    pub labels: Vec<String>,
    /// One series per label
    pub series: Vec<QuarterlySeries>,
}

impl QuarterlyExport {
    /// Pair labels with their series.
    pub fn new(labels: Vec<String>, series: Vec<QuarterlySeries>) -> Result<Self, ExportError> {
        if labels.len() != series.len() {
            return Err(ExportError::LabelMismatch {
                labels: labels.len(),
                series: series.len(),
            });
        }
        Ok(Self { labels, series })
    }

    /// Rows of `(quarter, values per label)` over the first series' quarters.
    pub fn rows(&self) -> Vec<(String, Vec<Option<f64>>)> {
        let Some(first) = self.series.first() else {
            return Vec::new();
        };
        first
            .quarters()
            .iter()
            .map(|q| (q.to_string(), self.series.iter().map(|s| s.get(q)).collect()))
            .collect()
    }
}

/// Serializable view of quarterly series.
#[derive(Debug, Serialize, Deserialize)]
struct QuarterlyRecord {
    quarter: String,
    values: Vec<Option<f64>>,
}

impl Exporter for QuarterlyExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec!["quarter".to_string()];
                header.extend(self.labels.iter().cloned());
                wtr.write_record(&header)?;
                for (quarter, values) in self.rows() {
                    let mut record = vec![quarter];
                    record.extend(values.into_iter().map(cell));
                    wtr.write_record(&record)?;
                }
                finish(wtr)
            }
            _ => {
                let records: Vec<QuarterlyRecord> = self
                    .rows()
                    .into_iter()
                    .map(|(quarter, values)| QuarterlyRecord { quarter, values })
                    .collect();
                json(
                    &serde_json::json!({ "labels": self.labels, "rows": records }),
                    format,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use everywhere_data::QuarterKey;
    use ndarray::array;

    fn component() -> PrincipalComponent {
        PrincipalComponent {
            columns: vec!["us_value".to_string(), "uk_value".to_string()],
            loadings: array![0.8, 0.6],
            explained_variance: 2.0,
            explained_variance_ratio: 0.75,
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "pretty-json".parse::<ExportFormat>().unwrap(),
            ExportFormat::PrettyJson
        );
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_correlation_csv_leaves_missing_blank() {
        let m = CorrelationMatrix::missing(vec!["VAL".to_string(), "MOM".to_string()]);
        let csv = m.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], ",VAL,MOM");
        assert_eq!(lines[1], "VAL,,");
    }

    #[test]
    fn test_correlation_json_uses_null() {
        let m = CorrelationMatrix::missing(vec!["VAL".to_string()]);
        let json = m.export_to_string(ExportFormat::Json).unwrap();
        assert_eq!(json, r#"{"labels":["VAL"],"values":[[null]]}"#);
    }

    #[test]
    fn test_component_csv() {
        let csv = component().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("component,column,loading,explained_variance_ratio"));
        assert!(csv.contains("1,us_value,0.8,0.75"));
        assert!(csv.contains("1,uk_value,0.6,0.75"));
    }

    #[test]
    fn test_components_csv_numbers_each() {
        let csv = vec![component(), component()]
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert!(csv.contains("2,uk_value"));
    }

    #[test]
    fn test_quarterly_export() {
        let q = vec![
            QuarterKey {
                year: 2020,
                quarter: 1,
            },
            QuarterKey {
                year: 2020,
                quarter: 2,
            },
        ];
        let export = QuarterlyExport::new(
            vec!["VAL".to_string(), "MOM".to_string()],
            vec![
                QuarterlySeries::new(q.clone(), vec![f64::NAN, 0.5]).unwrap(),
                QuarterlySeries::new(q, vec![0.25, -0.5]).unwrap(),
            ],
        )
        .unwrap();

        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "quarter,VAL,MOM");
        assert_eq!(lines[1], "2020Q1,,0.25");
        assert_eq!(lines[2], "2020Q2,0.5,-0.5");

        let json = export.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains(r#""quarter":"2020Q1","values":[null,0.25]"#));
    }

    #[test]
    fn test_quarterly_label_mismatch() {
        assert!(QuarterlyExport::new(vec!["a".to_string()], vec![]).is_err());
    }
}

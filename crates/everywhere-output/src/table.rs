//! Plain-text and Markdown tables.

use everywhere_risk::{CorrelationMatrix, PrincipalComponent};

use crate::export::QuarterlyExport;

const MISSING: &str = "-";

fn fmt_cell(value: Option<f64>, width: usize) -> String {
    value.map_or_else(
        || format!("{MISSING:>width$}"),
        |v| format!("{v:>width$.4}"),
    )
}

/// Render a correlation matrix.
///
/// Set `markdown` for a pipe table, otherwise a fixed-width ASCII table.
pub fn correlation_table(matrix: &CorrelationMatrix, markdown: bool) -> String {
    let mut output = String::new();
    if markdown {
        output.push_str("| |");
        for label in matrix.labels() {
            output.push_str(&format!(" {label} |"));
        }
        output.push('\n');
        output.push_str(&"|---".repeat(matrix.len() + 1));
        output.push_str("|\n");
        for (label, row) in matrix.labels().iter().zip(matrix.to_rows()) {
            output.push_str(&format!("| {label} |"));
            for v in row {
                let text = v.map_or_else(|| MISSING.to_string(), |x| format!("{x:.4}"));
                output.push_str(&format!(" {text} |"));
            }
            output.push('\n');
        }
        return output;
    }

    let width = matrix
        .labels()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(8);
    let rule = width + 1 + (width + 1) * matrix.len();

    output.push_str("\nAverage Correlation Matrix\n");
    output.push_str(&"=".repeat(rule));
    output.push('\n');
    output.push_str(&format!("{:<width$}", ""));
    for label in matrix.labels() {
        output.push_str(&format!(" {label:>width$}"));
    }
    output.push('\n');
    output.push_str(&"-".repeat(rule));
    output.push('\n');
    for (label, row) in matrix.labels().iter().zip(matrix.to_rows()) {
        output.push_str(&format!("{label:<width$}"));
        for v in row {
            output.push(' ');
            output.push_str(&fmt_cell(v, width));
        }
        output.push('\n');
    }
    output.push_str(&"=".repeat(rule));
    output.push('\n');
    output
}

/// Render quarterly portfolio returns, one column per portfolio.
pub fn quarterly_table(export: &QuarterlyExport) -> String {
    let width = export
        .labels
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(10);
    let mut output = String::new();
    output.push_str(&format!("{:<8}", "Quarter"));
    for label in &export.labels {
        output.push_str(&format!(" {label:>width$}"));
    }
    output.push('\n');
    output.push_str(&"-".repeat(8 + (width + 1) * export.labels.len()));
    output.push('\n');
    for (quarter, values) in export.rows() {
        output.push_str(&format!("{quarter:<8}"));
        for v in values {
            output.push(' ');
            output.push_str(&fmt_cell(v, width));
        }
        output.push('\n');
    }
    output
}

/// Render a principal component's loadings.
pub fn component_table(component: &PrincipalComponent) -> String {
    let mut output = String::new();
    output.push_str("\nFirst Principal Component\n");
    output.push_str(&"=".repeat(40));
    output.push('\n');
    output.push_str(&format!("{:<24} {:>15}\n", "Column", "Loading"));
    output.push_str(&"-".repeat(40));
    output.push('\n');
    for (column, loading) in component.columns.iter().zip(component.loadings.iter()) {
        output.push_str(&format!("{column:<24} {loading:>15.4}\n"));
    }
    output.push_str(&"-".repeat(40));
    output.push('\n');
    output.push_str(&format!(
        "Explained variance: {:.2}%\n",
        component.explained_variance_ratio * 100.0
    ));
    output
}

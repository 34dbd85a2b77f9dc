//! Demonstration of the everywhere-risk crate
//!
//! Builds a synthetic panel of value and momentum legs across three asset
//! classes, then:
//! - volatility-weights and aggregates each portfolio to quarters
//! - computes the average correlation matrix
//! - extracts the first principal component of the value legs

use everywhere_data::{ColumnSelection, PanelSplitter, PeriodKey, PortfolioLayout, ReturnPanel};
use everywhere_risk::{CorrelationAnalyzer, CorrelationConfig, PcaReducer};
use everywhere_weighting::{QuarterlyAggregator, QuarterlyConfig, VolatilityWeightingConfig};

fn main() {
    println!("==========================================================");
    println!("          everywhere-risk - Correlation Demo");
    println!("==========================================================\n");

    let panel = synthetic_panel(120);
    println!("Panel: {} months x {} columns\n", panel.n_periods(), panel.width());

    // value legs at 0, 2, 4; momentum legs at 1, 3, 5
    let layout = PortfolioLayout::grouped(vec![0, 1], 3, 2);
    let portfolios = PanelSplitter::split_layout(&panel, &layout).expect("valid layout");

    let aggregator = QuarterlyAggregator::new(QuarterlyConfig {
        weighting: VolatilityWeightingConfig {
            roll_window: 36,
            min_count: 1,
        },
        ignore_nan: true,
    })
    .expect("valid config");
    let quarterly = aggregator.aggregate(&portfolios).expect("aggregation");

    let labels = vec!["VAL".to_string(), "MOM".to_string()];
    let matrix = CorrelationAnalyzer::new(CorrelationConfig::default())
        .analyze(&quarterly, &portfolios, &labels)
        .expect("correlation")
        .symmetrize();

    println!("{:<8} {:>10} {:>10}", "", labels[0], labels[1]);
    for (i, row) in matrix.to_rows().iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|v| v.map_or_else(|| "-".to_string(), |x| format!("{x:.4}")))
            .collect();
        println!("{:<8} {:>10} {:>10}", labels[i], cells[0], cells[1]);
    }

    let pc = PcaReducer::try_default()
        .expect("valid config")
        .first_component(&panel, &ColumnSelection::strided(0, 3, 2))
        .expect("pca");
    println!("\nFirst principal component of value legs:");
    for (name, loading) in pc.columns.iter().zip(pc.loadings.iter()) {
        println!("  {name:<12} {loading:>8.4}");
    }
    println!(
        "  explained variance ratio: {:.2}%",
        pc.explained_variance_ratio * 100.0
    );
}

/// Deterministic pseudo-returns: a shared value factor, a momentum factor that
/// leans against it, and a per-asset wobble.
fn synthetic_panel(months: usize) -> ReturnPanel {
    let periods = (0..months)
        .map(|i| PeriodKey::from_ymd(1990 + (i / 12) as u32, (i % 12) as u32 + 1).expect("month"))
        .collect();
    let assets = ["us", "uk", "jp"];
    let mut columns = Vec::new();
    for (a, asset) in assets.iter().enumerate() {
        let scale = 0.01 * (a + 1) as f64;
        let value: Vec<f64> = (0..months)
            .map(|t| scale * ((t as f64 * 0.7).sin() + 0.3 * ((t + a) as f64 * 1.9).cos()))
            .collect();
        let momentum: Vec<f64> = (0..months)
            .map(|t| scale * (-(t as f64 * 0.7).sin() * 0.5 + ((t * (a + 2)) as f64 * 0.4).sin()))
            .collect();
        columns.push((format!("{asset}_value"), value));
        columns.push((format!("{asset}_momentum"), momentum));
    }
    ReturnPanel::from_columns(periods, columns).expect("panel")
}

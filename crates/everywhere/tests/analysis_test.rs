//! Full runs from tabular input and JSON configuration.

use approx::assert_abs_diff_eq;
use everywhere::{Analysis, AnalysisConfig, AnalysisError};
use polars::prelude::*;
use rstest::rstest;
use std::path::PathBuf;

const MONTHS: usize = 48;
const COLUMNS: [&str; 6] = [
    "us_value", "us_momentum", "uk_value", "uk_momentum", "jp_value", "jp_momentum",
];

fn value(t: usize, j: usize) -> f64 {
    // value legs share a common driver, momentum legs another
    let common = if j % 2 == 0 {
        (t as f64 * 0.9).sin()
    } else {
        (t as f64 * 0.4).cos()
    };
    0.02 * common + 0.005 * ((t * (j + 3)) as f64 * 1.3).sin()
}

fn frame() -> DataFrame {
    let dates: Vec<i64> = (0..MONTHS)
        .map(|i| (2016 + (i / 12) as i64) * 100 + (i % 12) as i64 + 1)
        .collect();
    let mut columns: Vec<Column> = vec![Series::new("date".into(), dates).into()];
    for (j, name) in COLUMNS.iter().enumerate() {
        let values: Vec<f64> = (0..MONTHS).map(|t| value(t, j)).collect();
        columns.push(Series::new((*name).into(), values).into());
    }
    DataFrame::new(columns).unwrap()
}

fn config_json(extra: &str) -> String {
    format!(
        r#"{{
            "layout": {{"starts": [0, 1], "group_size": 3, "stride": 2}},
            "labels": ["VAL", "MOM"],
            "quarterly": {{"weighting": {{"roll_window": 12}}}}{extra}
        }}"#
    )
}

#[test]
fn test_run_frame() {
    let config = AnalysisConfig::from_json(&config_json("")).unwrap();
    let report = Analysis::new(config).unwrap().run_frame(&frame()).unwrap();

    assert_eq!(report.correlation.labels(), ["VAL", "MOM"]);
    assert_eq!(report.period_range, Some((201601, 201912)));

    // 16 quarters; the first window closes in 2016-12
    let val = &report.quarterly.series[0];
    assert_eq!(val.quarters().len(), 16);
    assert_eq!(val.count_defined(), 13);

    for i in 0..2 {
        let diag = report.correlation.get(i, i).unwrap();
        assert!((-1.0..=1.0).contains(&diag));
    }
    let off = report.correlation.get(0, 1).unwrap();
    assert_abs_diff_eq!(off, report.correlation.get(1, 0).unwrap());
}

#[test]
fn test_run_with_pca() {
    let extra = r#",
        "pca": {"selection": {"start": 0, "group_size": 3, "stride": 2}}"#;
    let config = AnalysisConfig::from_json(&config_json(extra)).unwrap();
    let report = Analysis::new(config).unwrap().run_frame(&frame()).unwrap();

    let pc = report.pca.unwrap();
    assert_eq!(pc.columns, ["us_value", "uk_value", "jp_value"]);
    let norm: f64 = pc.loadings.iter().map(|l| l * l).sum();
    assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-9);
}

#[test]
fn test_config_from_file_and_csv_input() {
    let dir: PathBuf = std::env::temp_dir().join(format!("everywhere-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let config_path = dir.join("analysis.json");
    std::fs::write(&config_path, config_json("")).unwrap();

    let mut csv = format!("date,{}\n", COLUMNS.join(","));
    for t in 0..MONTHS {
        let row: Vec<String> = (0..COLUMNS.len()).map(|j| value(t, j).to_string()).collect();
        csv.push_str(&format!(
            "{}{:02},{}\n",
            2016 + t / 12,
            t % 12 + 1,
            row.join(",")
        ));
    }
    let csv_path = dir.join("returns.csv");
    std::fs::write(&csv_path, csv).unwrap();

    let config = AnalysisConfig::from_path(&config_path).unwrap();
    let analysis = Analysis::new(config).unwrap();
    let from_csv = analysis.run_csv(&csv_path).unwrap();
    let from_frame = analysis.run_frame(&frame()).unwrap();

    for i in 0..2 {
        for j in 0..2 {
            match (from_csv.correlation.get(i, j), from_frame.correlation.get(i, j)) {
                (Some(a), Some(b)) => assert_abs_diff_eq!(a, b, epsilon = 1e-9),
                (a, b) => assert_eq!(a, b),
            }
        }
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[rstest]
#[case(r#"{"layout": {"starts": []}}"#)]
#[case(r#"{"layout": {"starts": [0]}, "labels": ["a", "b"]}"#)]
#[case(r#"{"layout": {"starts": [0], "group_size": 0}}"#)]
fn test_rejected_configs(#[case] json: &str) {
    assert!(matches!(
        AnalysisConfig::from_json(json),
        Err(AnalysisError::Config(_))
    ));
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        AnalysisConfig::from_path("/nonexistent/everywhere.json"),
        Err(AnalysisError::Io(_))
    ));
}

#[test]
fn test_rerun_is_identical() {
    let config = AnalysisConfig::from_json(&config_json("")).unwrap();
    let analysis = Analysis::new(config).unwrap();
    let a = analysis.run_frame(&frame()).unwrap();
    let b = analysis.run_frame(&frame()).unwrap();
    assert_eq!(a.correlation.to_rows(), b.correlation.to_rows());
    assert_eq!(a.quarterly.rows(), b.quarterly.rows());
}

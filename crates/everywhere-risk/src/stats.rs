//! Pairwise-complete sample statistics.
//!
//! Missing values are `NaN`. Each statistic uses only the observations where
//! both inputs are present, so different pairs of columns may be estimated over
//! different periods.

use ndarray::{Array2, ArrayView1};

fn complete_pairs(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect()
}

/// Sample covariance (ddof = 1) over complete pairs, `None` with fewer than two.
pub fn covariance(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> Option<f64> {
    let pairs = complete_pairs(x, y);
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let cov = pairs.iter().map(|(a, b)| (a - mx) * (b - my)).sum::<f64>() / (n - 1) as f64;
    Some(cov)
}

/// Pearson correlation over complete pairs.
///
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> Option<f64> {
    let pairs = complete_pairs(x, y);
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Covariance matrix of the columns of `data`, `NaN` where a pair has fewer
/// than two complete observations.
pub fn pairwise_covariance(data: &Array2<f64>) -> Array2<f64> {
    let k = data.ncols();
    let mut cov = Array2::<f64>::from_elem((k, k), f64::NAN);
    for i in 0..k {
        for j in i..k {
            if let Some(c) = covariance(data.column(i), data.column(j)) {
                cov[[i, j]] = c;
                cov[[j, i]] = c;
            }
        }
    }
    cov
}

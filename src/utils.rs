//! Robust statistics and small regressions used for aggregation and starting
//! values.
//!
//! All helpers return `None` instead of `NaN` when the input is too short or
//! degenerate, so callers can fall back to configured guesses explicitly.
use statrs::statistics::{Data, Median, OrderStatistics, Statistics};

/// Median of `values`; `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let data = Data::new(values.to_vec());
    Some(Median::median(&data))
}

/// Sample standard deviation (n − 1); `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sd = values.iter().std_dev();
    sd.is_finite().then_some(sd)
}

/// `p`-th percentile (0–100) of `values`; `None` when empty.
pub fn percentile(values: &[f64], p: usize) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(data.percentile(p.min(100)))
}

/// Ordinary least squares `y = a + b·x`, returned as `(a, b)`.
///
/// `None` for fewer than two points, mismatched lengths, or constant `x`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let var_x = x.iter().variance();
    if !(var_x > 0.0) {
        return None;
    }
    let slope = x.iter().covariance(y.iter()) / var_x;
    let intercept = y.iter().mean() - slope * x.iter().mean();
    (slope.is_finite() && intercept.is_finite()).then_some((intercept, slope))
}

/// Least squares slope of `y = b·x` through the origin.
pub fn through_origin_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    if !(sxx > 0.0) {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let slope = sxy / sxx;
    slope.is_finite().then_some(slope)
}

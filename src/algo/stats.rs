//! Statistical helpers for raster analysis
//!
//! All functions here are NaN-aware: non-finite values are excluded from
//! order statistics and range scans rather than poisoning the result.

use std::f64::consts::PI;

/// Probability density of a 1-D normal distribution
///
/// # Arguments
/// * `x` - Evaluation point
/// * `mean` - Distribution mean
/// * `sigma` - Standard deviation, must be positive
pub fn normal_pdf(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Compute the p-th percentile of a slice of values
///
/// Uses linear interpolation between the closest order statistics. Non-finite
/// values are filtered out before ranking.
///
/// # Arguments
/// * `values` - Sample data
/// * `p` - Percentile in `[0, 100]`
///
/// # Returns
/// `None` if no finite values remain after filtering.
///
/// # Panics
/// Panics if `p` is outside `[0, 100]`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    assert!(
        (0.0..=100.0).contains(&p),
        "Percentile must be between 0 and 100"
    );

    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = p / 100.0 * (finite.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    if below == above {
        return Some(finite[below]);
    }

    // Interpolate between the two bracketing order statistics
    let t = rank - below as f64;
    Some(finite[below] * (1.0 - t) + finite[above] * t)
}

/// Scan for the minimum and maximum finite values
///
/// # Returns
/// `None` if the iterator yields no finite values.
pub fn finite_min_max<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;

    for &value in values {
        if !value.is_finite() {
            continue;
        }
        range = match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        };
    }

    range
}

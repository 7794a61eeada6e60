//! Contrast enhancement for human-viewable output
//!
//! Two steps: an upper-percentile ceiling clip that tames bright outlier
//! pixels, followed by a linear stretch into a target value range.

use ndarray::Array2;

use crate::algo::stats::{finite_min_max, percentile};

/// Default upper percentile for the ceiling clip
pub const DEFAULT_PERCENTILE_CEILING: f64 = 99.5;

/// Clip every value above the p-th percentile down to that percentile
///
/// Values at or below the ceiling pass through unchanged.
///
/// # Panics
/// Panics if `p` is outside `[0, 100]`.
pub fn percentile_ceiling(image: &Array2<f64>, p: f64) -> Array2<f64> {
    let values: Vec<f64> = image.iter().copied().collect();
    match percentile(&values, p) {
        Some(ceiling) => image.mapv(|v| v.min(ceiling)),
        // No finite values to rank against
        None => image.clone(),
    }
}

/// Linearly stretch an image into `[minval, maxval]`
///
/// Subtracts the image minimum, divides by the post-subtraction maximum and
/// scales into the target range. A constant image cannot be stretched and
/// maps to all-`minval` instead of dividing by zero. Non-finite values are
/// ignored when scanning the input range.
///
/// # Panics
/// Panics if `minval >= maxval`.
pub fn contrast_stretch(image: &Array2<f64>, minval: f64, maxval: f64) -> Array2<f64> {
    assert!(
        minval < maxval,
        "Stretch bounds must satisfy minval < maxval"
    );

    let Some((lo, hi)) = finite_min_max(image.iter()) else {
        return image.clone();
    };

    let span = hi - lo;
    if span <= 0.0 {
        // Already saturated
        return Array2::from_elem(image.dim(), minval);
    }

    image.mapv(|v| (v - lo) / span * (maxval - minval) + minval)
}

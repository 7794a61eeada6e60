//! Probability-mass normalization of raw rasters
//!
//! Downstream consumers always receive a valid probability-mass-style image:
//! when the raw raster cannot be normalized (zero or non-finite total mass),
//! a uniform flat image of the same shape is substituted and the substitution
//! is reported both through the returned outcome and a warning-level log
//! event.

use log::warn;
use ndarray::Array2;

/// How a raster was turned into a probability-mass image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizeOutcome {
    /// Raster divided by its (positive, finite) total mass
    Normalized { total: f64 },
    /// Degenerate raster replaced by a uniform image summing to 1
    UniformFallback,
}

impl NormalizeOutcome {
    /// Whether the uniform fallback was substituted
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::UniformFallback)
    }
}

/// Normalize a raster so its values sum to 1
///
/// Returns the normalized image together with the outcome. A raster with
/// zero or non-finite total mass yields the uniform image `1/(rows*cols)`
/// everywhere rather than a division-by-zero result; an empty raster is
/// returned unchanged (both degenerate cases report
/// [`NormalizeOutcome::UniformFallback`]).
pub fn normalize(image: &Array2<f64>) -> (Array2<f64>, NormalizeOutcome) {
    let total = image.sum();
    if total.is_finite() && total > 0.0 {
        return (image / total, NormalizeOutcome::Normalized { total });
    }

    warn!("raster not normalizable (total mass {total}); substituting uniform image");

    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return (image.clone(), NormalizeOutcome::UniformFallback);
    }
    let mass = 1.0 / (rows * cols) as f64;
    (
        Array2::from_elem((rows, cols), mass),
        NormalizeOutcome::UniformFallback,
    )
}

//! Kernel-evaluation engine for localization rasterization
//!
//! Given a localization set and a magnification, each render mode produces a
//! raw (unnormalized) `Array2<f64>` raster. All modes share the same index
//! transform: a localization at camera-pixel position `v` lands at the
//! 1-based continuous output coordinate `mag * (v - 0.5) + 0.5`, which
//! magnifies about the pixel-center convention so that the center of the
//! first pixel stays fixed at any magnification.
//!
//! Edge-case policy, common to all modes: a kernel window entirely outside
//! the raster contributes nothing, a localization without a usable
//! uncertainty is skipped wherever the mode needs one, and non-finite
//! intermediate values contribute zero rather than propagating into the
//! output.

use ndarray::Array2;
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::algo::stats::normal_pdf;
use crate::image_size::RasterShape;
use crate::localization::{Localization, LocalizationSet};

/// Default Gaussian truncation radius in standard deviations
pub const DEFAULT_NSIGMA: f64 = 5.0;

/// Kernel model used to rasterize each localization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Nearest pixel set to 1.0; collisions are idempotent
    Binary,
    /// Nearest pixel accumulated by 1.0; collisions sum
    Histogram,
    /// Ring of radius sigma drawn around each localization
    Circle,
    /// Truncated separable 2-D Gaussian density splat
    Gaussian,
}

/// Rasterize a localization set with the given kernel model
///
/// Dispatches to the per-mode functions below; `nsigma` is only consulted by
/// [`RenderMode::Gaussian`]. The magnification must be positive and finite
/// (the pipeline validates this before calling in).
pub fn rasterize(
    set: &LocalizationSet,
    magnification: f64,
    mode: RenderMode,
    nsigma: f64,
) -> Array2<f64> {
    match mode {
        RenderMode::Binary => render_binary(set, magnification),
        RenderMode::Histogram => render_histogram(set, magnification),
        RenderMode::Circle => render_circle(set, magnification),
        RenderMode::Gaussian => render_gaussian(set, magnification, nsigma),
    }
}

/// Map a camera-pixel coordinate into the 1-based continuous output frame
fn to_output(v: f64, magnification: f64) -> f64 {
    magnification * (v - 0.5) + 0.5
}

/// Nearest 0-based index for a 1-based output coordinate, clamped into the raster
fn nearest_index_clamped(u: f64, size: usize) -> Option<usize> {
    if !u.is_finite() {
        return None;
    }
    let index = (u.round() as i64).clamp(1, size as i64);
    Some(index as usize - 1)
}

fn empty_raster(set: &LocalizationSet, magnification: f64) -> Array2<f64> {
    let shape = RasterShape::from_data_size(set.size_x(), set.size_y(), magnification);
    Array2::zeros(shape.to_dim())
}

/// Render each localization as a single hot pixel
///
/// The nearest output pixel is set to 1.0. Repeated hits on the same pixel
/// are idempotent; out-of-range localizations clamp to the raster border.
pub fn render_binary(set: &LocalizationSet, magnification: f64) -> Array2<f64> {
    let mut image = empty_raster(set, magnification);
    let (rows, cols) = image.dim();

    for loc in set.localizations() {
        let cx = to_output(loc.x(), magnification);
        let cy = to_output(loc.y(), magnification);
        let (Some(col), Some(row)) = (
            nearest_index_clamped(cx, cols),
            nearest_index_clamped(cy, rows),
        ) else {
            continue;
        };
        image[[row, col]] = 1.0;
    }

    image
}

/// Render each localization as a unit count in a 2-D histogram
///
/// Identical index mapping to [`render_binary`], but collisions accumulate.
pub fn render_histogram(set: &LocalizationSet, magnification: f64) -> Array2<f64> {
    let mut image = empty_raster(set, magnification);
    let (rows, cols) = image.dim();

    for loc in set.localizations() {
        let cx = to_output(loc.x(), magnification);
        let cy = to_output(loc.y(), magnification);
        let (Some(col), Some(row)) = (
            nearest_index_clamped(cx, cols),
            nearest_index_clamped(cy, rows),
        ) else {
            continue;
        };
        image[[row, col]] += 1.0;
    }

    image
}

/// Render each localization as a ring at its uncertainty radius
///
/// Localizations without a usable uncertainty are skipped. The ring radius
/// is the mean per-axis sigma scaled by the magnification; sampling density
/// grows with the radius to keep the drawn ring visually continuous. Samples
/// only mark pixels strictly inside the raster (no border clamping, unlike
/// the binary mode).
pub fn render_circle(set: &LocalizationSet, magnification: f64) -> Array2<f64> {
    let mut image = empty_raster(set, magnification);
    let (rows, cols) = image.dim();

    for loc in set.localizations() {
        let Some((sigma_x, sigma_y)) = loc.uncertainty() else {
            continue;
        };
        let radius = 0.5 * (sigma_x + sigma_y) * magnification;
        let cx = to_output(loc.x(), magnification);
        let cy = to_output(loc.y(), magnification);
        if !cx.is_finite() || !cy.is_finite() || !radius.is_finite() {
            continue;
        }

        let n_samples = ((4.0 * 2.0 * PI * radius).ceil()).max(4.0) as usize;
        for k in 0..n_samples {
            let theta = 2.0 * PI * k as f64 / n_samples as f64;
            let px = cx + radius * theta.cos();
            let py = cy + radius * theta.sin();
            if !px.is_finite() || !py.is_finite() {
                continue;
            }

            // Strictly inside [1, size) on both axes, 1-based
            let col = px.round() as i64;
            let row = py.round() as i64;
            if col < 1 || row < 1 || col >= cols as i64 || row >= rows as i64 {
                continue;
            }
            image[[row as usize - 1, col as usize - 1]] = 1.0;
        }
    }

    image
}

/// Clip a 1-based window `center ± reach` to `[1, size]`
///
/// Returns `None` when the window lies entirely outside the raster.
fn clipped_window(center: f64, reach: f64, size: usize) -> Option<(usize, usize)> {
    let lo = (center - reach).floor();
    let hi = (center + reach).ceil();
    if !lo.is_finite() || !hi.is_finite() || hi < 1.0 || lo > size as f64 {
        return None;
    }
    Some((lo.max(1.0) as usize, hi.min(size as f64) as usize))
}

/// Accumulate one truncated Gaussian splat into an existing raster
fn splat_gaussian(image: &mut Array2<f64>, loc: &Localization, magnification: f64, nsigma: f64) {
    let Some((sigma_x, sigma_y)) = loc.uncertainty() else {
        return;
    };
    let (rows, cols) = image.dim();

    let cx = to_output(loc.x(), magnification);
    let cy = to_output(loc.y(), magnification);
    let sx = sigma_x * magnification;
    let sy = sigma_y * magnification;
    if !cx.is_finite() || !cy.is_finite() || !sx.is_finite() || !sy.is_finite() {
        return;
    }

    let Some((col_lo, col_hi)) = clipped_window(cx, nsigma * sx, cols) else {
        return;
    };
    let Some((row_lo, row_hi)) = clipped_window(cy, nsigma * sy, rows) else {
        return;
    };

    // Separable product of two 1-D normal densities, evaluated at the
    // pixel sample points (i - 0.5) of the 1-based output frame
    for i in row_lo..=row_hi {
        let gy = normal_pdf(i as f64 - 0.5, cy, sy);
        for j in col_lo..=col_hi {
            let value = normal_pdf(j as f64 - 0.5, cx, sx) * gy;
            if value.is_finite() {
                image[[i - 1, j - 1]] += value;
            }
        }
    }
}

/// Render each localization as a truncated 2-D Gaussian density
///
/// The kernel window spans `center ± nsigma * sigma` per axis in output
/// pixels, clipped to the raster; overlapping splats sum. Localizations
/// without a usable uncertainty are skipped.
pub fn render_gaussian(set: &LocalizationSet, magnification: f64, nsigma: f64) -> Array2<f64> {
    let mut image = empty_raster(set, magnification);
    for loc in set.localizations() {
        splat_gaussian(&mut image, loc, magnification, nsigma);
    }
    image
}

/// Parallel variant of [`render_gaussian`]
///
/// Splats are accumulated into per-thread partial rasters which are reduced
/// at the end, so no two threads ever write the same array. Output matches
/// the serial path up to floating-point addition order.
pub fn render_gaussian_parallel(
    set: &LocalizationSet,
    magnification: f64,
    nsigma: f64,
) -> Array2<f64> {
    let shape = RasterShape::from_data_size(set.size_x(), set.size_y(), magnification);
    let dim = shape.to_dim();

    set.localizations()
        .par_iter()
        .fold(
            || Array2::zeros(dim),
            |mut partial, loc| {
                splat_gaussian(&mut partial, loc, magnification, nsigma);
                partial
            },
        )
        .reduce(|| Array2::zeros(dim), |acc, partial| acc + partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn set_of(locs: Vec<Localization>, size: f64) -> LocalizationSet {
        LocalizationSet::new(locs, size, size).unwrap()
    }

    fn argmax(image: &Array2<f64>) -> (usize, usize) {
        let mut best = ((0, 0), f64::NEG_INFINITY);
        for ((r, c), &v) in image.indexed_iter() {
            if v > best.1 {
                best = ((r, c), v);
            }
        }
        best.0
    }

    #[test]
    fn test_binary_is_idempotent_histogram_accumulates() {
        // Two localizations landing on the same output pixel
        let locs = vec![
            Localization::point(5.1, 5.1, 100.0),
            Localization::point(4.9, 4.9, 100.0),
        ];

        let binary = render_binary(&set_of(locs.clone(), 10.0), 1.0);
        assert_relative_eq!(binary.sum(), 1.0);
        assert_relative_eq!(binary[[4, 4]], 1.0);

        let histogram = render_histogram(&set_of(locs, 10.0), 1.0);
        assert_relative_eq!(histogram.sum(), 2.0);
        assert_relative_eq!(histogram[[4, 4]], 2.0);
    }

    #[test]
    fn test_histogram_mass_conservation() {
        // In-bounds localizations with no collisions: total mass equals count
        let locs: Vec<Localization> = (1..=8)
            .map(|i| Localization::point(i as f64, i as f64, 10.0))
            .collect();
        let histogram = render_histogram(&set_of(locs, 10.0), 1.0);
        assert_relative_eq!(histogram.sum(), 8.0);
    }

    #[test]
    fn test_binary_clamps_out_of_range() {
        let locs = vec![
            Localization::point(-50.0, -50.0, 1.0),
            Localization::point(500.0, 500.0, 1.0),
        ];
        let binary = render_binary(&set_of(locs, 10.0), 1.0);
        assert_relative_eq!(binary[[0, 0]], 1.0);
        assert_relative_eq!(binary[[9, 9]], 1.0);
        assert_relative_eq!(binary.sum(), 2.0);
    }

    #[test]
    fn test_binary_skips_non_finite_coordinates() {
        let locs = vec![Localization::point(f64::NAN, 5.0, 1.0)];
        let binary = render_binary(&set_of(locs, 10.0), 1.0);
        assert_relative_eq!(binary.sum(), 0.0);
    }

    #[test]
    fn test_raster_shape_scales_with_magnification() {
        let set = set_of(vec![], 12.0);
        assert_eq!(render_binary(&set, 1.0).dim(), (12, 12));
        assert_eq!(render_binary(&set, 10.0).dim(), (120, 120));
        assert_eq!(render_binary(&set, 0.01).dim(), (1, 1));
    }

    #[test]
    fn test_gaussian_scenario_mag_10() {
        // One localization at (1.0, 1.0) with sigma 0.1 rendered at
        // magnification 10: center lands at 5.5 in the 1-based output frame
        // and the window is fully inside the raster, so the splat carries
        // unit mass up to 5-sigma truncation error.
        let locs = vec![Localization::with_uncertainty(1.0, 1.0, 0.1, 0.1, 500.0)];
        let image = render_gaussian(&set_of(locs, 2.0), 10.0, DEFAULT_NSIGMA);

        assert_eq!(image.dim(), (20, 20));
        assert_relative_eq!(image.sum(), 1.0, epsilon = 1e-4);
        // Sample point closest to the 5.5 center is pixel 6 (0-based 5)
        assert_eq!(argmax(&image), (5, 5));
    }

    #[test]
    fn test_gaussian_mass_independent_of_magnification() {
        for mag in [2.0, 5.0, 10.0] {
            let locs = vec![Localization::with_uncertainty(10.0, 10.0, 2.0 / mag, 2.0 / mag, 1.0)];
            let image = render_gaussian(&set_of(locs, 20.0), mag, DEFAULT_NSIGMA);
            assert_relative_eq!(image.sum(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_gaussian_centering_center_of_mass() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let x = rng.gen_range(15.0..35.0);
            let y = rng.gen_range(15.0..35.0);
            let locs = vec![Localization::with_uncertainty(x, y, 2.0, 2.0, 1.0)];
            let image = render_gaussian(&set_of(locs, 50.0), 1.0, DEFAULT_NSIGMA);

            let mut total = 0.0;
            let mut x_cm = 0.0;
            let mut y_cm = 0.0;
            for ((r, c), &v) in image.indexed_iter() {
                total += v;
                // 0-based column c is 1-based pixel c+1, sampled at c + 0.5
                x_cm += (c as f64 + 0.5) * v;
                y_cm += (r as f64 + 0.5) * v;
            }
            x_cm /= total;
            y_cm /= total;

            // Expected center in the 1-based output frame at mag 1 is the
            // camera coordinate itself
            assert_relative_eq!(x_cm, x, epsilon = 1e-3);
            assert_relative_eq!(y_cm, y, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_gaussian_skips_invalid_sigma() {
        let locs = vec![
            Localization::with_uncertainty(5.0, 5.0, 0.0, 1.0, 1.0),
            Localization::with_uncertainty(5.0, 5.0, -0.5, 1.0, 1.0),
            Localization::point(5.0, 5.0, 1.0),
        ];
        let image = render_gaussian(&set_of(locs, 10.0), 1.0, DEFAULT_NSIGMA);
        assert_relative_eq!(image.sum(), 0.0);
    }

    #[test]
    fn test_gaussian_window_fully_outside() {
        let locs = vec![Localization::with_uncertainty(-100.0, -100.0, 1.0, 1.0, 1.0)];
        let image = render_gaussian(&set_of(locs, 10.0), 1.0, DEFAULT_NSIGMA);
        assert_relative_eq!(image.sum(), 0.0);
    }

    #[test]
    fn test_gaussian_edge_splat_is_partial() {
        // A splat centered on the raster edge loses roughly half its mass
        let locs = vec![Localization::with_uncertainty(0.0, 10.0, 2.0, 2.0, 1.0)];
        let image = render_gaussian(&set_of(locs, 20.0), 1.0, DEFAULT_NSIGMA);
        let mass = image.sum();
        assert!(mass > 0.3 && mass < 0.7, "edge mass {mass} not near half");
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut rng = StdRng::seed_from_u64(7);
        let locs: Vec<Localization> = (0..200)
            .map(|_| {
                Localization::with_uncertainty(
                    rng.gen_range(0.0..30.0),
                    rng.gen_range(0.0..30.0),
                    rng.gen_range(0.2..2.0),
                    rng.gen_range(0.2..2.0),
                    1.0,
                )
            })
            .collect();
        let set = set_of(locs, 30.0);

        let serial = render_gaussian(&set, 2.0, DEFAULT_NSIGMA);
        let parallel = render_gaussian_parallel(&set, 2.0, DEFAULT_NSIGMA);

        assert_eq!(serial.dim(), parallel.dim());
        for (a, b) in serial.iter().zip(parallel.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-10, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_circle_draws_ring() {
        let locs = vec![Localization::with_uncertainty(10.0, 10.0, 1.5, 1.5, 1.0)];
        let image = render_circle(&set_of(locs, 20.0), 2.0);

        // Ring pixels are set, not accumulated
        for &v in image.iter() {
            assert!(v == 0.0 || v == 1.0);
        }
        assert!(image.sum() > 4.0, "ring should mark several pixels");

        // The ring center itself stays empty at radius 3 output pixels
        let (row, col) = (
            to_output(10.0, 2.0).round() as usize - 1,
            to_output(10.0, 2.0).round() as usize - 1,
        );
        assert_relative_eq!(image[[row, col]], 0.0);
    }

    #[test]
    fn test_circle_skips_missing_uncertainty() {
        let locs = vec![
            Localization::point(10.0, 10.0, 1.0),
            Localization::with_uncertainty(10.0, 10.0, 0.0, 0.0, 1.0),
        ];
        let image = render_circle(&set_of(locs, 20.0), 1.0);
        assert_relative_eq!(image.sum(), 0.0);
    }

    #[test]
    fn test_circle_clips_at_border() {
        // Ring centered near the corner: out-of-raster samples are dropped
        let locs = vec![Localization::with_uncertainty(0.5, 0.5, 2.0, 2.0, 1.0)];
        let image = render_circle(&set_of(locs, 10.0), 1.0);
        for &v in image.iter() {
            assert!(v == 0.0 || v == 1.0);
        }
    }

    #[test]
    fn test_rasterize_dispatch() {
        let locs = vec![Localization::with_uncertainty(5.0, 5.0, 1.0, 1.0, 1.0)];
        let set = set_of(locs, 10.0);

        for mode in [
            RenderMode::Binary,
            RenderMode::Histogram,
            RenderMode::Circle,
            RenderMode::Gaussian,
        ] {
            let image = rasterize(&set, 1.0, mode, DEFAULT_NSIGMA);
            assert_eq!(image.dim(), (10, 10));
            assert!(image.iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }

    #[test]
    fn test_fuzz_never_panics_and_stays_finite() {
        let mut rng = StdRng::seed_from_u64(42);

        let mut locs = Vec::new();
        for _ in 0..500 {
            let x = rng.gen_range(-100.0..200.0);
            let y = rng.gen_range(-100.0..200.0);
            if rng.gen_bool(0.5) {
                locs.push(Localization::with_uncertainty(
                    x,
                    y,
                    rng.gen_range(-1.0..3.0),
                    rng.gen_range(-1.0..3.0),
                    rng.gen_range(0.0..1e4),
                ));
            } else {
                locs.push(Localization::point(x, y, rng.gen_range(0.0..1e4)));
            }
        }
        let set = LocalizationSet::new(locs, 37.0, 61.0).unwrap();

        for mode in [
            RenderMode::Binary,
            RenderMode::Histogram,
            RenderMode::Circle,
            RenderMode::Gaussian,
        ] {
            let image = rasterize(&set, 3.0, mode, DEFAULT_NSIGMA);
            assert!(image.iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }
}

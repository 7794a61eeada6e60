//! Conversions between physical micron coordinates and pixel coordinates
//!
//! The pixel grid uses the center-of-first-pixel convention: pixel index 1
//! of a 1-based grid is centered at `pixel_size / 2`, so a continuous pixel
//! coordinate `px` maps to the physical position `(px - 0.5) * pixel_size`.
//! All conversions are exact mathematical inverses of each other up to
//! floating-point rounding.

use crate::units::{Length, LengthExt};

/// Convert a continuous pixel coordinate to a physical position in microns
pub fn pixel_to_physical(px: f64, py: f64, pixel_size: Length) -> (f64, f64) {
    let s = pixel_size.as_micrometers();
    ((px - 0.5) * s, (py - 0.5) * s)
}

/// Convert a physical position in microns to a continuous pixel coordinate
///
/// Exact inverse of [`pixel_to_physical`].
pub fn physical_to_pixel(x: f64, y: f64, pixel_size: Length) -> (f64, f64) {
    let s = pixel_size.as_micrometers();
    (x / s + 0.5, y / s + 0.5)
}

/// Find the discrete pixel containing a physical position
///
/// Rounds the continuous pixel coordinate to the nearest integer index.
/// Used by the binary and histogram render modes.
pub fn physical_to_pixel_index(x: f64, y: f64, pixel_size: Length) -> (i64, i64) {
    let (px, py) = physical_to_pixel(x, y, pixel_size);
    (px.round() as i64, py.round() as i64)
}

/// Pixel boundary positions for a camera grid, in microns
///
/// Produces `n_pixels + 1` strictly increasing edges starting at 0 and
/// spaced by the pixel size. Pixel centers are the midpoints between
/// consecutive edges.
pub fn pixel_edges(n_pixels: usize, pixel_size: Length) -> Vec<f64> {
    let s = pixel_size.as_micrometers();
    (0..=n_pixels).map(|i| i as f64 * s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_first_pixel_center() {
        let s = Length::from_micrometers(0.1);
        let (x, y) = pixel_to_physical(1.0, 1.0, s);
        assert_relative_eq!(x, 0.05);
        assert_relative_eq!(y, 0.05);
    }

    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let pixel_size = Length::from_micrometers(rng.gen_range(0.005..20.0));
            let px = rng.gen_range(-500.0..500.0);
            let py = rng.gen_range(-500.0..500.0);

            let (x, y) = pixel_to_physical(px, py, pixel_size);
            let (px2, py2) = physical_to_pixel(x, y, pixel_size);

            assert_relative_eq!(px2, px, epsilon = 1e-9, max_relative = 1e-12);
            assert_relative_eq!(py2, py, epsilon = 1e-9, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_pixel_index() {
        let s = Length::from_micrometers(0.1);
        // Center of pixel 3 is at 0.25 um
        assert_eq!(physical_to_pixel_index(0.25, 0.25, s), (3, 3));
        // Just past the boundary between pixels 3 and 4
        assert_eq!(physical_to_pixel_index(0.301, 0.25, s), (4, 3));
    }

    #[test]
    fn test_pixel_edges() {
        let edges = pixel_edges(4, Length::from_micrometers(0.5));
        assert_eq!(edges.len(), 5);
        assert_relative_eq!(edges[0], 0.0);
        assert_relative_eq!(edges[4], 2.0);

        for pair in edges.windows(2) {
            assert!(pair[0] < pair[1], "edges must be strictly increasing");
            assert_relative_eq!(pair[1] - pair[0], 0.5);
        }
    }

    #[test]
    fn test_centers_are_edge_midpoints() {
        let s = Length::from_micrometers(0.5);
        let edges = pixel_edges(4, s);
        for i in 0..4 {
            let midpoint = (edges[i] + edges[i + 1]) / 2.0;
            let (cx, _) = pixel_to_physical((i + 1) as f64, 1.0, s);
            assert_relative_eq!(cx, midpoint);
        }
    }
}

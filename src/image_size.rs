//! Raster dimensions and size utilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output raster dimensions
///
/// Represents the width and height of a rendered raster. Uses usize for
/// direct compatibility with ndarray indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterShape {
    /// Raster width in pixels
    pub width: usize,
    /// Raster height in pixels
    pub height: usize,
}

impl RasterShape {
    /// Create a new RasterShape
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Compute the raster shape for a data extent at a given magnification
    ///
    /// Each axis is `round(data_size * magnification)` with a floor of one
    /// pixel, so a degenerate extent still yields an addressable raster.
    /// Memory grows with the square of magnification; bounding the
    /// magnification is the caller's responsibility.
    pub fn from_data_size(size_x: f64, size_y: f64, magnification: f64) -> Self {
        let width = ((size_x * magnification).round() as usize).max(1);
        let height = ((size_y * magnification).round() as usize).max(1);
        Self { width, height }
    }

    /// Get total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Convert to an ndarray dimension tuple (rows, cols)
    pub fn to_dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

impl fmt::Display for RasterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_size() {
        let shape = RasterShape::from_data_size(256.0, 128.0, 1.0);
        assert_eq!(shape, RasterShape::new(256, 128));

        let shape = RasterShape::from_data_size(256.0, 128.0, 10.0);
        assert_eq!(shape, RasterShape::new(2560, 1280));

        // Fractional extents round to the nearest pixel
        let shape = RasterShape::from_data_size(10.4, 10.6, 1.0);
        assert_eq!(shape, RasterShape::new(10, 11));
    }

    #[test]
    fn test_minimum_one_pixel() {
        let shape = RasterShape::from_data_size(1.0, 1.0, 0.1);
        assert_eq!(shape, RasterShape::new(1, 1));
        assert_eq!(shape.pixel_count(), 1);
    }

    #[test]
    fn test_to_dim_is_row_major() {
        let shape = RasterShape::new(640, 480);
        assert_eq!(shape.to_dim(), (480, 640));
        assert_eq!(format!("{shape}"), "640x480");
    }
}

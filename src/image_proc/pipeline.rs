//! Rendering pipeline orchestration
//!
//! Composes coordinate mapping, rasterization, normalization and contrast
//! enhancement behind per-mode entry points. Every call is a pure function
//! of its explicit inputs; the pipeline holds only its validated
//! configuration and no state survives across calls except the returned
//! image.

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image_proc::contrast::{
    contrast_stretch, percentile_ceiling, DEFAULT_PERCENTILE_CEILING,
};
use crate::image_proc::normalize::{normalize, NormalizeOutcome};
use crate::image_proc::raster::{
    rasterize, render_binary, render_circle, render_gaussian, render_histogram, RenderMode,
    DEFAULT_NSIGMA,
};
use crate::localization::LocalizationSet;
use crate::units::{Length, LengthExt};

/// Errors raised by render configuration validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Input pixel size must be positive and finite, got {0} um")]
    InvalidInputPixelSize(f64),
    #[error("Output pixel size must be positive and finite, got {0} um")]
    InvalidOutputPixelSize(f64),
    #[error("Gaussian truncation radius must be positive and finite, got {0} sigma")]
    InvalidNsigma(f64),
    #[error("Percentile ceiling must be in [0, 100], got {0}")]
    InvalidPercentile(f64),
    #[error("Contrast stretch bounds must satisfy min < max, got [{0}, {1}]")]
    InvalidStretchBounds(f64, f64),
}

/// Rendering parameters shared by all entry points
///
/// The magnification is derived, never stored: the ratio of input (camera)
/// pixel size to output (rendered) pixel size. Raster memory grows with the
/// square of the magnification; bounding it is the caller's responsibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Physical size of one camera pixel
    pub input_pixel_size: Length,
    /// Physical size of one rendered pixel
    pub output_pixel_size: Length,
    /// Gaussian truncation radius in standard deviations
    pub nsigma: f64,
    /// Upper percentile for the contrast ceiling clip
    pub percentile_ceiling: f64,
    /// Lower bound of the contrast stretch range
    pub stretch_min: f64,
    /// Upper bound of the contrast stretch range
    pub stretch_max: f64,
}

impl RenderConfig {
    /// Create a configuration with default enhancement parameters
    /// (`nsigma = 5.0`, ceiling percentile 99.5, stretch range `[0, 1]`)
    pub fn new(input_pixel_size: Length, output_pixel_size: Length) -> Self {
        Self {
            input_pixel_size,
            output_pixel_size,
            nsigma: DEFAULT_NSIGMA,
            percentile_ceiling: DEFAULT_PERCENTILE_CEILING,
            stretch_min: 0.0,
            stretch_max: 1.0,
        }
    }

    /// Output magnification factor, `input_pixel_size / output_pixel_size`
    pub fn magnification(&self) -> f64 {
        self.input_pixel_size.as_micrometers() / self.output_pixel_size.as_micrometers()
    }

    /// Validate all parameters, failing fast before any raster allocation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let input_um = self.input_pixel_size.as_micrometers();
        if !input_um.is_finite() || input_um <= 0.0 {
            return Err(ConfigError::InvalidInputPixelSize(input_um));
        }

        let output_um = self.output_pixel_size.as_micrometers();
        if !output_um.is_finite() || output_um <= 0.0 {
            return Err(ConfigError::InvalidOutputPixelSize(output_um));
        }

        if !self.nsigma.is_finite() || self.nsigma <= 0.0 {
            return Err(ConfigError::InvalidNsigma(self.nsigma));
        }

        if !(0.0..=100.0).contains(&self.percentile_ceiling) {
            return Err(ConfigError::InvalidPercentile(self.percentile_ceiling));
        }

        if !self.stretch_min.is_finite()
            || !self.stretch_max.is_finite()
            || self.stretch_min >= self.stretch_max
        {
            return Err(ConfigError::InvalidStretchBounds(
                self.stretch_min,
                self.stretch_max,
            ));
        }

        Ok(())
    }
}

/// Result of the composed Gaussian entry point
///
/// Carries the enhanced image together with the normalization outcome so
/// callers can tell a real density map from the uniform fallback without
/// consulting the log.
#[derive(Debug, Clone)]
pub struct GaussianImage {
    /// Enhanced image, values within the configured stretch range
    pub image: Array2<f64>,
    /// Whether normalization succeeded or fell back to uniform
    pub normalization: NormalizeOutcome,
}

/// Stateless rendering pipeline with a validated configuration
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    config: RenderConfig,
}

impl RenderPipeline {
    /// Create a pipeline, validating the configuration up front
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Raw raster for an arbitrary render mode
    pub fn render(&self, set: &LocalizationSet, mode: RenderMode) -> Array2<f64> {
        rasterize(set, self.config.magnification(), mode, self.config.nsigma)
    }

    /// Raw binary (hot-pixel) raster
    pub fn render_binary(&self, set: &LocalizationSet) -> Array2<f64> {
        render_binary(set, self.config.magnification())
    }

    /// Raw histogram raster
    pub fn render_histogram(&self, set: &LocalizationSet) -> Array2<f64> {
        render_histogram(set, self.config.magnification())
    }

    /// Raw circle (uncertainty ring) raster
    pub fn render_circle(&self, set: &LocalizationSet) -> Array2<f64> {
        render_circle(set, self.config.magnification())
    }

    /// Raw Gaussian density raster
    pub fn render_gaussian(&self, set: &LocalizationSet) -> Array2<f64> {
        render_gaussian(set, self.config.magnification(), self.config.nsigma)
    }

    /// Histogram raster normalized to unit total mass
    pub fn render_histogram_normalized(
        &self,
        set: &LocalizationSet,
    ) -> (Array2<f64>, NormalizeOutcome) {
        normalize(&self.render_histogram(set))
    }

    /// Gaussian raster normalized to unit total mass
    pub fn render_gaussian_normalized(
        &self,
        set: &LocalizationSet,
    ) -> (Array2<f64>, NormalizeOutcome) {
        normalize(&self.render_gaussian(set))
    }

    /// Composed Gaussian entry point producing a viewable image
    ///
    /// Gaussian rasterization, normalization, percentile ceiling clip and
    /// contrast stretch into the configured range, in that order.
    pub fn render_gaussian_image(&self, set: &LocalizationSet) -> GaussianImage {
        debug!(
            "rendering {} localizations at magnification {:.3}",
            set.len(),
            self.config.magnification()
        );

        let (normalized, normalization) = self.render_gaussian_normalized(set);
        let clipped = percentile_ceiling(&normalized, self.config.percentile_ceiling);
        let image = contrast_stretch(&clipped, self.config.stretch_min, self.config.stretch_max);

        GaussianImage {
            image,
            normalization,
        }
    }
}

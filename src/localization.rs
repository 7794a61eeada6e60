//! Localization records and localization sets
//!
//! A localization is a single estimated emitter position produced by an
//! upstream fitting stage. Two record variants exist: a plain point (no
//! positional uncertainty available) and an uncertainty-bearing point. The
//! rendering engine only consumes the accessors defined here, never the
//! concrete record shape, so further variants can be added without touching
//! the rasterizer.
//!
//! Coordinates and uncertainties are expressed in camera pixel units (units
//! of the input pixel grid). See [`crate::image_proc::coordinates`] for
//! converting between physical micron positions and camera pixels.

use thiserror::Error;

/// Errors raised when constructing a localization set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocalizationSetError {
    #[error("Data size must be positive and finite, got {0} x {1} camera pixels")]
    InvalidDataSize(f64, f64),
}

/// A single estimated emitter position
///
/// Uncertainties may be recorded as zero or negative by the upstream fitter
/// to signal "invalid/unknown"; [`Localization::uncertainty`] maps those to
/// `None` so uncertainty-dependent render modes can skip the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Localization {
    /// Position only, no uncertainty estimate
    Point { x: f64, y: f64, photons: f64 },
    /// Position with per-axis positional uncertainty
    WithUncertainty {
        x: f64,
        y: f64,
        sigma_x: f64,
        sigma_y: f64,
        photons: f64,
    },
}

impl Localization {
    /// Create a plain point localization
    pub fn point(x: f64, y: f64, photons: f64) -> Self {
        Self::Point { x, y, photons }
    }

    /// Create an uncertainty-bearing localization
    pub fn with_uncertainty(x: f64, y: f64, sigma_x: f64, sigma_y: f64, photons: f64) -> Self {
        Self::WithUncertainty {
            x,
            y,
            sigma_x,
            sigma_y,
            photons,
        }
    }

    /// X position in camera pixels
    pub fn x(&self) -> f64 {
        match *self {
            Self::Point { x, .. } | Self::WithUncertainty { x, .. } => x,
        }
    }

    /// Y position in camera pixels
    pub fn y(&self) -> f64 {
        match *self {
            Self::Point { y, .. } | Self::WithUncertainty { y, .. } => y,
        }
    }

    /// Estimated brightness in photons
    ///
    /// Carried through for downstream consumers; no current render mode
    /// weights by brightness.
    pub fn photons(&self) -> f64 {
        match *self {
            Self::Point { photons, .. } | Self::WithUncertainty { photons, .. } => photons,
        }
    }

    /// Per-axis positional uncertainty in camera pixels, if usable
    ///
    /// Returns `None` for the plain variant and whenever either sigma is
    /// non-finite or non-positive. Render modes that need an uncertainty
    /// silently skip localizations without one.
    pub fn uncertainty(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Point { .. } => None,
            Self::WithUncertainty {
                sigma_x, sigma_y, ..
            } => {
                if sigma_x.is_finite() && sigma_x > 0.0 && sigma_y.is_finite() && sigma_y > 0.0 {
                    Some((sigma_x, sigma_y))
                } else {
                    None
                }
            }
        }
    }
}

/// An ordered collection of localizations with a physical extent
///
/// The data size defines the native (unmagnified) image bounds in camera
/// pixels. Localizations are expected to lie within `[0, data size]` but
/// out-of-range records are legal: their out-of-raster contributions are
/// clipped or dropped during rendering, never an error.
#[derive(Debug, Clone)]
pub struct LocalizationSet {
    localizations: Vec<Localization>,
    size_x: f64,
    size_y: f64,
}

impl LocalizationSet {
    /// Create a new localization set with the given per-axis extent
    ///
    /// Fails fast on a non-finite or non-positive data size, before any
    /// raster allocation can happen downstream.
    pub fn new(
        localizations: Vec<Localization>,
        size_x: f64,
        size_y: f64,
    ) -> Result<Self, LocalizationSetError> {
        if !size_x.is_finite() || size_x <= 0.0 || !size_y.is_finite() || size_y <= 0.0 {
            return Err(LocalizationSetError::InvalidDataSize(size_x, size_y));
        }

        Ok(Self {
            localizations,
            size_x,
            size_y,
        })
    }

    /// Localizations in insertion order
    pub fn localizations(&self) -> &[Localization] {
        &self.localizations
    }

    /// Extent along x in camera pixels
    pub fn size_x(&self) -> f64 {
        self.size_x
    }

    /// Extent along y in camera pixels
    pub fn size_y(&self) -> f64 {
        self.size_y
    }

    /// Number of localizations in the set
    pub fn len(&self) -> usize {
        self.localizations.len()
    }

    /// Whether the set contains no localizations
    pub fn is_empty(&self) -> bool {
        self.localizations.is_empty()
    }
}

//! Localization-to-image rendering and image enhancement
//!
//! The submodules form a one-directional pipeline: coordinate mapping,
//! kernel rasterization, probability-mass normalization, and contrast
//! enhancement, orchestrated by [`pipeline`].

pub mod contrast;
pub mod coordinates;
pub mod normalize;
pub mod pipeline;
pub mod raster;

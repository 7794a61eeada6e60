//! General-purpose numerical algorithms used by the rendering engine

pub mod stats;

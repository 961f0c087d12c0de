//! Grid geometry and canvas sizing.

pub mod geometry;

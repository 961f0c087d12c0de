//! Image loading and the video collaborator seam.
//!
//! The [`cache::ImageCache`] deduplicates concurrent loads, bounds parallel fetches and evicts
//! least-recently-used bitmaps under a pixel budget.

/// Deduplicating, bounded, LRU image cache.
pub mod cache;
/// Raster and SVG decoding into paintable bitmaps.
pub mod decode;
/// Locator to bytes.
pub mod fetch;
/// Video sources and the opener trait.
pub mod media;

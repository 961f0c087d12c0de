//! CPU rendering of a scene into device-resolution frames.

/// Device-resolution layers reused across frames.
pub mod caches;
pub(crate) mod draw;
/// Frame composition, hit-testing and pixel-ratio management.
pub mod pipeline;
/// Frame sinks.
pub mod surface;

pub use pipeline::{Overlay, RenderStats, Renderer};
pub use surface::{OffscreenSurface, Surface};

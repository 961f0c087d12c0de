//! Scene model: assets in z-order, the background layer, selection and snapshots.

/// Constructors for newly placed assets.
pub mod create;
/// Asset and background types.
pub mod model;
/// Serializable captures used by history, the clipboard and scene documents.
pub mod snapshot;
/// The mutable scene and its operations.
pub mod store;

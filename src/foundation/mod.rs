/// Color parsing and conversion.
pub mod color;
/// Shared geometry and pixel types.
pub mod core;
/// Error taxonomy.
pub mod error;

//! Pointer gestures over the scene.

/// Resize handle geometry and cursors.
pub mod handles;
/// The gesture state machine.
pub mod machine;
pub mod resize;

pub use handles::{Cursor, Handle};
pub use machine::{Board, GestureKind, Interaction, Modifiers, Response};

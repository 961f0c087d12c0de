//! Font shorthand parsing, measurement and word wrapping.

pub mod engine;
pub mod font;
pub mod wrap;

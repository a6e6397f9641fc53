//! Paint model shared between the task model, draw units and drivers.
//!
//! Scope:
//! - colors (24-bit base color, 32-bit BGRA pixel)
//! - opacity
//! - pixel formats and their in-memory layout
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod format;

pub use color::{Color, Color32, Opa};
pub use format::ColorFormat;

/// Gradient direction of a fill.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum GradDir {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// How a source is combined with the destination.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
}

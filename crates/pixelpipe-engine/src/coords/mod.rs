//! Integer geometry shared by the task model, the draw units and the drivers.
//!
//! Canonical space:
//! - physical pixels
//! - origin top-left, +X right, +Y down
//! - areas are inclusive on both ends (`x2`/`y2` are the last covered pixel)

mod area;
mod point;

pub use area::Area;
pub use point::Point;

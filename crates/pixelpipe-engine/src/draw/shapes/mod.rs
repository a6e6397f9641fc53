//! Typed descriptors for each primitive plus `Renderer` helpers that record them.

pub(crate) mod border;
pub(crate) mod fill;
pub(crate) mod image;
pub(crate) mod label;
pub(crate) mod line;
pub(crate) mod mask;

pub use border::BorderDsc;
pub use fill::FillDsc;
pub use image::{ImageDsc, ImageStyle, LayerDsc, SCALE_NONE};
pub use label::LabelDsc;
pub use line::LineDsc;
pub use mask::MaskRectDsc;

use crate::draw::shapes::border::BorderDsc;
use crate::draw::shapes::fill::FillDsc;
use crate::draw::shapes::image::{ImageDsc, LayerDsc};
use crate::draw::shapes::label::LabelDsc;
use crate::draw::shapes::line::LineDsc;
use crate::draw::shapes::mask::MaskRectDsc;

/// Primitive carried by a draw task, with its typed descriptor.
///
/// Extending the task model:
/// - add a descriptor module under `draw::shapes::*`
/// - add a new variant here
/// - implement the add helper inside that shape module
/// - teach the units that can execute it (`sw`, `ppe`)
#[derive(Debug, Clone)]
pub enum DrawTaskKind {
    Fill(FillDsc),
    Image(ImageDsc),
    /// Composite of another layer's buffer, transformed like an image.
    Layer(LayerDsc),
    Line(LineDsc),
    MaskRect(MaskRectDsc),
    Border(BorderDsc),
    Label(LabelDsc),
}

impl DrawTaskKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            DrawTaskKind::Fill(_) => "fill",
            DrawTaskKind::Image(_) => "image",
            DrawTaskKind::Layer(_) => "layer",
            DrawTaskKind::Line(_) => "line",
            DrawTaskKind::MaskRect(_) => "mask-rect",
            DrawTaskKind::Border(_) => "border",
            DrawTaskKind::Label(_) => "label",
        }
    }
}

use std::sync::Arc;

use crate::coords::Area;
use crate::draw::{DrawTask, DrawTaskKind, Layer, Renderer};
use crate::paint::{Color, Opa};

/// Text payload. Glyph rasterization is outside this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDsc {
    pub text: String,
    pub color: Color,
    pub opa: Opa,
}

impl Renderer {
    /// Records a text draw command.
    pub fn add_label(
        &self,
        layer: &Arc<Layer>,
        area: Area,
        clip: Area,
        text: impl Into<String>,
        color: Color,
    ) -> Arc<DrawTask> {
        let dsc = LabelDsc { text: text.into(), color, opa: Opa::COVER };
        self.add_task(layer, area, clip, DrawTaskKind::Label(dsc))
    }
}

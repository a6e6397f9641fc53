use std::sync::Arc;

use crate::coords::Area;
use crate::draw::{DrawTask, DrawTaskKind, Layer, Renderer};
use crate::paint::{Color, GradDir, Opa};

/// Rectangle fill payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FillDsc {
    pub color: Color,
    pub opa: Opa,
    /// Corner radius in pixels; `0` is a sharp rectangle.
    pub radius: i32,
    pub grad: GradDir,
}

impl FillDsc {
    #[inline]
    pub fn solid(color: Color, opa: Opa) -> Self {
        Self { color, opa, radius: 0, grad: GradDir::None }
    }

    #[inline]
    pub fn with_radius(mut self, radius: i32) -> Self {
        self.radius = radius;
        self
    }

    #[inline]
    pub fn with_gradient(mut self, grad: GradDir) -> Self {
        self.grad = grad;
        self
    }
}

impl Renderer {
    /// Records a fill of `area`, clipped to `clip`.
    #[inline]
    pub fn add_fill(&self, layer: &Arc<Layer>, area: Area, clip: Area, dsc: FillDsc) -> Arc<DrawTask> {
        self.add_task(layer, area, clip, DrawTaskKind::Fill(dsc))
    }

    /// Records an opaque solid fill clipped to the layer.
    #[inline]
    pub fn fill_solid(&self, layer: &Arc<Layer>, area: Area, color: Color) -> Arc<DrawTask> {
        self.add_fill(layer, area, layer.buf_area(), FillDsc::solid(color, Opa::COVER))
    }
}

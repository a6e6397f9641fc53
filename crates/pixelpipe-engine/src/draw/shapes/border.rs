use std::sync::Arc;

use crate::coords::Area;
use crate::draw::{DrawTask, DrawTaskKind, Layer, Renderer};
use crate::paint::{Color, Opa};

/// Stroke drawn along the inner edge of an area.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderDsc {
    pub color: Color,
    pub opa: Opa,
    pub width: i32,
    pub radius: i32,
}

impl BorderDsc {
    #[inline]
    pub fn new(width: i32, color: Color) -> Self {
        Self { color, opa: Opa::COVER, width, radius: 0 }
    }

    /// Top, bottom, left and right strips of `area` covered by the stroke.
    pub fn strips(&self, area: Area) -> Vec<Area> {
        let w = self.width;
        if w <= 0 {
            return Vec::new();
        }
        let strips = [
            Area::new(area.x1, area.y1, area.x2, area.y1 + w - 1),
            Area::new(area.x1, area.y2 - w + 1, area.x2, area.y2),
            Area::new(area.x1, area.y1 + w, area.x1 + w - 1, area.y2 - w),
            Area::new(area.x2 - w + 1, area.y1 + w, area.x2, area.y2 - w),
        ];
        strips.into_iter().filter(|s| !s.is_empty()).collect()
    }
}

impl Renderer {
    #[inline]
    pub fn add_border(&self, layer: &Arc<Layer>, area: Area, clip: Area, dsc: BorderDsc) -> Arc<DrawTask> {
        self.add_task(layer, area, clip, DrawTaskKind::Border(dsc))
    }
}

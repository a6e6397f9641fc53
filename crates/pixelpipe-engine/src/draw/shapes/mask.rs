use std::sync::Arc;

use crate::coords::Area;
use crate::draw::{DrawTask, DrawTaskKind, Layer, Renderer};

/// Rectangular mask payload: everything inside the clip but outside `area` is cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskRectDsc {
    pub area: Area,
    pub radius: i32,
}

impl MaskRectDsc {
    /// The up-to-four bands of `clip` that lie outside `self.area`, in the
    /// order top, bottom, left, right. Empty bands are omitted.
    pub fn clear_bands(&self, clip: Area) -> Vec<Area> {
        let m = self.area;
        let bands = [
            Area::new(clip.x1, clip.y1, clip.x2, m.y1 - 1),
            Area::new(clip.x1, m.y2 + 1, clip.x2, clip.y2),
            Area::new(clip.x1, m.y1, m.x1 - 1, m.y2),
            Area::new(m.x2 + 1, m.y1, clip.x2, m.y2),
        ];
        bands.into_iter().filter_map(|b| b.intersect(clip)).collect()
    }
}

impl Renderer {
    /// Records a rectangle mask applied to the `clip` region of `layer`.
    #[inline]
    pub fn add_mask_rect(&self, layer: &Arc<Layer>, clip: Area, dsc: MaskRectDsc) -> Arc<DrawTask> {
        self.add_task(layer, clip, clip, DrawTaskKind::MaskRect(dsc))
    }
}

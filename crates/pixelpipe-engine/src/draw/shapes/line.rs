use std::sync::Arc;

use crate::coords::{Area, Point};
use crate::draw::{DrawTask, DrawTaskKind, Layer, Renderer};
use crate::paint::{Color, Opa};

/// Straight line payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDsc {
    pub p1: Point,
    pub p2: Point,
    /// Stroke width in pixels.
    pub width: i32,
    pub color: Color,
    pub opa: Opa,
    pub round_start: bool,
    pub round_end: bool,
    pub dash_width: i32,
    pub dash_gap: i32,
}

impl LineDsc {
    #[inline]
    pub fn new(p1: Point, p2: Point, width: i32, color: Color) -> Self {
        Self {
            p1,
            p2,
            width,
            color,
            opa: Opa::COVER,
            round_start: false,
            round_end: false,
            dash_width: 0,
            dash_gap: 0,
        }
    }

    #[inline]
    pub fn is_axis_aligned(&self) -> bool {
        self.p1.x == self.p2.x || self.p1.y == self.p2.y
    }

    /// Bounding box of the stroke, grown by half the width on every side.
    pub fn bounds(&self) -> Area {
        let half = self.width / 2;
        Area::new(
            self.p1.x.min(self.p2.x) - half,
            self.p1.y.min(self.p2.y) - half,
            self.p1.x.max(self.p2.x) + half,
            self.p1.y.max(self.p2.y) + half,
        )
    }
}

impl Renderer {
    /// Records a line clipped to `clip`. The task area is the stroke's bounding box.
    #[inline]
    pub fn add_line(&self, layer: &Arc<Layer>, clip: Area, dsc: LineDsc) -> Arc<DrawTask> {
        self.add_task(layer, dsc.bounds(), clip, DrawTaskKind::Line(dsc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_grow_by_half_width() {
        let l = LineDsc::new(Point::new(10, 20), Point::new(80, 20), 4, Color::black());
        assert_eq!(l.bounds(), Area::new(8, 18, 82, 22));
    }

    #[test]
    fn diagonal_is_not_axis_aligned() {
        let l = LineDsc::new(Point::new(0, 0), Point::new(10, 10), 1, Color::black());
        assert!(!l.is_axis_aligned());
    }
}

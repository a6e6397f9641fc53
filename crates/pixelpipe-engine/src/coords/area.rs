use super::Point;

/// Axis-aligned pixel rectangle with inclusive corners.
///
/// `Area::new(0, 0, 9, 9)` covers 10×10 pixels. An area with `x2 < x1` or
/// `y2 < y1` is empty.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Area {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Area {
    #[inline]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds an area from its top-left corner and a size in pixels.
    #[inline]
    pub const fn from_origin_size(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(x, y, x + w - 1, y + h - 1)
    }

    #[inline]
    pub fn origin(self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[inline]
    pub fn width(self) -> i32 {
        self.x2 - self.x1 + 1
    }

    #[inline]
    pub fn height(self) -> i32 {
        self.y2 - self.y1 + 1
    }

    /// Number of covered pixels; `0` for empty areas.
    #[inline]
    pub fn size(self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width() as u64 * self.height() as u64
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    #[inline]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    /// Returns `true` if `other` lies completely inside `self`.
    #[inline]
    pub fn contains_area(self, other: Area) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    #[inline]
    pub fn intersect(self, other: Area) -> Option<Area> {
        let a = Area::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        );

        if a.is_empty() { None } else { Some(a) }
    }

    #[inline]
    pub fn overlaps(self, other: Area) -> bool {
        self.intersect(other).is_some()
    }

    /// Shifts the area by `(dx, dy)`.
    #[inline]
    pub fn translate(self, dx: i32, dy: i32) -> Area {
        Area::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Grows the area by `d` pixels on every side.
    #[inline]
    pub fn expand(self, d: i32) -> Area {
        Area::new(self.x1 - d, self.y1 - d, self.x2 + d, self.y2 + d)
    }
}

use bytemuck::{Pod, Zeroable};

/// Opacity, `0` (transparent) to `255` (cover).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Opa(pub u8);

impl Opa {
    pub const TRANSP: Opa = Opa(0);
    /// Anything at or below is treated as invisible.
    pub const MIN: Opa = Opa(2);
    pub const HALF: Opa = Opa(128);
    /// Anything at or above is treated as fully opaque.
    pub const MAX: Opa = Opa(253);
    pub const COVER: Opa = Opa(255);

    #[inline]
    pub fn is_visible(self) -> bool {
        self > Opa::MIN
    }
}

/// 24-bit color without alpha.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a color from a `0xRRGGBB` literal.
    #[inline]
    pub const fn hex(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::rgb(0xff, 0xff, 0xff)
    }

    #[inline]
    pub const fn to_32(self, opa: Opa) -> Color32 {
        Color32 { b: self.b, g: self.g, r: self.r, a: opa.0 }
    }
}

/// 32-bit pixel in memory order (B, G, R, A).
///
/// This is also the byte layout of `Xrgb8888`/`Argb8888` buffers, so pixels can
/// be read and written with `bytemuck` casts.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
pub struct Color32 {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color32 {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    #[inline]
    pub const fn rgb(self) -> Color {
        Color::rgb(self.r, self.g, self.b)
    }

    /// Packs into the accelerator's constant-color register layout.
    #[inline]
    pub const fn to_abgr8888(self) -> u32 {
        (self.a as u32) << 24 | (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }

    #[inline]
    pub const fn from_abgr8888(v: u32) -> Self {
        Self::new(v as u8, (v >> 8) as u8, (v >> 16) as u8, (v >> 24) as u8)
    }

    /// Source-over composite of `self` onto `bg` using `self.a` as coverage.
    pub fn over(self, bg: Color32) -> Color32 {
        match self.a {
            255 => self,
            0 => bg,
            a => {
                let a = a as u32;
                let inv = 255 - a;
                let mix = |f: u8, b: u8| ((f as u32 * a + b as u32 * inv + 127) / 255) as u8;
                Color32::new(
                    mix(self.r, bg.r),
                    mix(self.g, bg.g),
                    mix(self.b, bg.b),
                    (a + (bg.a as u32 * inv + 127) / 255) as u8,
                )
            }
        }
    }
}

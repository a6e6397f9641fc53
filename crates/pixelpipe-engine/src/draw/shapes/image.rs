use std::sync::Arc;

use crate::coords::Area;
use crate::draw::{DrawBuf, DrawTask, DrawTaskKind, Layer, Renderer};
use crate::paint::{BlendMode, Color, Opa};

/// Identity scale in the 8.8 fixed-point scale descriptors.
pub const SCALE_NONE: u32 = 256;

/// Transform and blend parameters shared by image and layer composites.
#[derive(Debug, Clone)]
pub struct ImageStyle {
    pub opa: Opa,
    /// Rotation in 0.1° units.
    pub rotation: i32,
    /// 8.8 fixed point; [`SCALE_NONE`] is 1.0.
    pub scale_x: u32,
    pub scale_y: u32,
    pub recolor: Color,
    pub recolor_opa: Opa,
    pub blend_mode: BlendMode,
    /// Repeat the image over the whole task area.
    pub tile: bool,
    pub bitmap_mask: Option<DrawBuf>,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            opa: Opa::COVER,
            rotation: 0,
            scale_x: SCALE_NONE,
            scale_y: SCALE_NONE,
            recolor: Color::black(),
            recolor_opa: Opa::TRANSP,
            blend_mode: BlendMode::Normal,
            tile: false,
            bitmap_mask: None,
        }
    }
}

impl ImageStyle {
    #[inline]
    pub fn has_transform(&self) -> bool {
        self.rotation != 0 || self.scale_x != SCALE_NONE || self.scale_y != SCALE_NONE
    }

    #[inline]
    pub fn has_recolor(&self) -> bool {
        self.recolor_opa > Opa::MIN
    }
}

/// Image draw payload. `src` holds decoded pixels.
#[derive(Debug, Clone)]
pub struct ImageDsc {
    pub src: DrawBuf,
    pub style: ImageStyle,
}

impl ImageDsc {
    #[inline]
    pub fn new(src: DrawBuf) -> Self {
        Self { src, style: ImageStyle::default() }
    }
}

/// Layer composite payload: draws `src`'s buffer like an image.
#[derive(Debug, Clone)]
pub struct LayerDsc {
    pub src: Arc<Layer>,
    pub style: ImageStyle,
}

impl Renderer {
    /// Records an image whose top-left lands at `coords.x1/y1`.
    #[inline]
    pub fn add_image(&self, layer: &Arc<Layer>, coords: Area, clip: Area, dsc: ImageDsc) -> Arc<DrawTask> {
        self.add_task(layer, coords, clip, DrawTaskKind::Image(dsc))
    }

    /// Records the composite of a child layer onto `layer`.
    #[inline]
    pub fn add_layer(&self, layer: &Arc<Layer>, coords: Area, clip: Area, dsc: LayerDsc) -> Arc<DrawTask> {
        self.add_task(layer, coords, clip, DrawTaskKind::Layer(dsc))
    }
}

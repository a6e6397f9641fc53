use bitflags::bitflags;

use crate::paint::ColorFormat;

use super::{DmaAddr, IrqHandler};

/// Pixel formats understood by the accelerator's layers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PpeFormat {
    Rgb565,
    Rgb888,
    Argb8888,
}

impl PpeFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PpeFormat::Rgb565 => 2,
            PpeFormat::Rgb888 => 3,
            PpeFormat::Argb8888 => 4,
        }
    }

    /// Memory layout of this format.
    #[inline]
    pub const fn color_format(self) -> ColorFormat {
        match self {
            PpeFormat::Rgb565 => ColorFormat::Rgb565,
            PpeFormat::Rgb888 => ColorFormat::Rgb888,
            PpeFormat::Argb8888 => ColorFormat::Argb8888,
        }
    }
}

impl From<ColorFormat> for PpeFormat {
    /// `Xrgb8888` is read as `Argb8888`; the hardware has no padded format.
    fn from(cf: ColorFormat) -> Self {
        match cf {
            ColorFormat::Rgb565 => PpeFormat::Rgb565,
            ColorFormat::Rgb888 => PpeFormat::Rgb888,
            ColorFormat::Xrgb8888 | ColorFormat::Argb8888 => PpeFormat::Argb8888,
        }
    }
}

/// Where an input layer fetches its pixels from.
#[derive(Debug, Clone, PartialEq)]
pub enum PicSource {
    /// Read through DMA starting at the address.
    Dma(DmaAddr),
    /// Every pixel is the layer's constant color.
    Const,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Interp {
    #[default]
    NearestNeighbor,
    Bilinear,
}

/// Where the result layer takes its background from.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BackgroundSource {
    #[default]
    Layer1,
    Const,
}

/// The accelerator's three input layers. Only layer 1 can rotate.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InputLayer {
    Layer1,
    Layer2,
    Layer3,
}

impl InputLayer {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            InputLayer::Layer1 => 0,
            InputLayer::Layer2 => 1,
            InputLayer::Layer3 => 2,
        }
    }

    #[inline]
    pub const fn enable_bit(self) -> LayerEnable {
        match self {
            InputLayer::Layer1 => LayerEnable::LAYER1,
            InputLayer::Layer2 => LayerEnable::LAYER2,
            InputLayer::Layer3 => LayerEnable::LAYER3,
        }
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
    pub struct LayerEnable: u32 {
        const LAYER1 = 1 << 1;
        const LAYER2 = 1 << 2;
        const LAYER3 = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
    pub struct PpeIrq: u32 {
        /// Every enabled layer has been processed.
        const ALL_OVER = 1 << 0;
        const FRAME_OVER = 1 << 1;
        const LOAD_OVER = 1 << 2;
        const LINE_WATERMARK = 1 << 3;
        const BUS_ERROR = 1 << 4;
    }
}

/// Input layer registers.
///
/// The window (`win_*`) is the region of the result frame this layer covers;
/// the picture is scaled and rotated into it.
#[derive(Debug, Clone, PartialEq)]
pub struct InputLayerConfig {
    pub source: PicSource,
    pub pic_width: u32,
    pub pic_height: u32,
    pub format: PpeFormat,
    /// Bytes per source row.
    pub line_len: u32,
    pub const_abgr8888: u32,
    /// Layer-wide alpha, multiplied into every sampled pixel's alpha.
    pub alpha: u8,
    pub interp: Interp,
    pub win_min_x: u32,
    pub win_min_y: u32,
    pub win_max_x: u32,
    pub win_max_y: u32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270.
    pub angle: u32,
}

impl Default for InputLayerConfig {
    fn default() -> Self {
        Self {
            source: PicSource::Const,
            pic_width: 0,
            pic_height: 0,
            format: PpeFormat::Argb8888,
            line_len: 0,
            const_abgr8888: 0xFFFF_FFFF,
            alpha: 0xFF,
            interp: Interp::NearestNeighbor,
            win_min_x: 0,
            win_min_y: 0,
            win_max_x: 0,
            win_max_y: 0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0,
        }
    }
}

/// Result layer registers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLayerConfig {
    pub dest: DmaAddr,
    pub pic_width: u32,
    pub pic_height: u32,
    pub format: PpeFormat,
    pub line_len: u32,
    pub bg_src: BackgroundSource,
    pub const_bg: u32,
    /// Processing block size. Rotation needs 16×16 blocks.
    pub blk_width: u32,
    pub blk_height: u32,
}

impl ResultLayerConfig {
    pub fn new(dest: DmaAddr) -> Self {
        Self {
            dest,
            pic_width: 0,
            pic_height: 0,
            format: PpeFormat::Argb8888,
            line_len: 0,
            bg_src: BackgroundSource::Layer1,
            const_bg: 0xFFFF_FFFF,
            blk_width: 0,
            blk_height: 0,
        }
    }
}

/// Register-level access to the pixel-processing engine.
///
/// Methods take `&self`: the peripheral is shared between the worker that
/// programs it and the interrupt handler that acknowledges it.
pub trait PpeHardware: Send + Sync {
    fn init_input_layer(&self, layer: InputLayer, config: &InputLayerConfig);

    fn init_result_layer(&self, config: &ResultLayerConfig);

    /// Selects which input layers take part in the next run.
    fn enable_layers(&self, layers: LayerEnable);

    fn register_irq(&self, handler: IrqHandler);

    fn set_irq_mask(&self, irq: PpeIrq, enable: bool);

    fn irq_status(&self) -> PpeIrq;

    fn clear_irq(&self, irq: PpeIrq);

    /// Starts processing with the programmed configuration.
    fn start(&self);
}

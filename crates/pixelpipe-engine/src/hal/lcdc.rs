use bitflags::bitflags;

use crate::paint::ColorFormat;

use super::{DmaAddr, IrqHandler};

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
    pub struct LcdcIrq: u32 {
        /// Last line of a frame was sent.
        const FRAME_DONE = 1 << 0;
        /// Scanout reached the configured line.
        const LINE_HIT = 1 << 1;
        /// A new frame started scanning out (vertical blank ended).
        const FRAME_START = 1 << 2;
        /// The DMA could not keep up with the pixel clock.
        const DMA_UNDERFLOW = 1 << 3;
    }
}

/// RGB interface sync timing, in lines (vertical) and pixel clocks (horizontal).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RgbTiming {
    pub vsw: u32,
    pub vbp: u32,
    pub vfp: u32,
    pub hsw: u32,
    pub hbp: u32,
    pub hfp: u32,
}

impl Default for RgbTiming {
    fn default() -> Self {
        Self { vsw: 1, vbp: 4, vfp: 6, hsw: 4, hbp: 40, hfp: 40 }
    }
}

/// Panel initialization parameters.
///
/// Only `width`, `height`, `format` and `line_interrupt` matter to the driver;
/// the rest is handed to the controller as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    /// Scanout line that raises [`LcdcIrq::LINE_HIT`].
    pub line_interrupt: u32,
    pub refresh_hz: u32,
    pub dma_burst: u32,
    pub timing: RgbTiming,
}

impl PanelConfig {
    /// Default panel with the given input format.
    pub fn with_format(format: ColorFormat) -> Self {
        Self { format, ..Self::default() }
    }

    /// Bytes in one full frame.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        let height = 480;
        Self {
            width: 800,
            height,
            format: ColorFormat::Rgb565,
            line_interrupt: height * 5 / 6,
            refresh_hz: 60,
            dma_burst: 2,
            timing: RgbTiming::default(),
        }
    }
}

/// Register-level access to the LCD controller.
pub trait LcdcHardware: Send + Sync {
    fn enable(&self, on: bool);

    fn init_rgb(&self, panel: &PanelConfig);

    fn set_dma_burst(&self, size: u32);

    fn register_irq(&self, handler: IrqHandler);

    fn set_line_irq_position(&self, line: u32);

    fn set_irq_mask(&self, irq: LcdcIrq, enable: bool);

    fn irq_status(&self) -> LcdcIrq;

    fn clear_irq(&self, irq: LcdcIrq);

    /// Programs the scanout source into the shadow registers.
    fn set_dma_image(&self, addr: DmaAddr);

    /// Requests the shadow registers be applied at the next frame boundary.
    fn shadow_reload(&self);
}

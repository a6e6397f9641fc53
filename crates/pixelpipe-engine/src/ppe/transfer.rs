use std::error::Error;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::draw::DmaAddr;
use crate::hal::{
    BackgroundSource, CacheOps, InputLayer, InputLayerConfig, Interp, IrqHandler, LayerEnable,
    PicSource, PpeHardware, PpeIrq, ResultLayerConfig,
};
use crate::paint::{Color32, ColorFormat, Opa};
use crate::sync::{BinarySemaphore, lock};

use super::BLOCK_ALIGN;

/// One side of a transfer: what the accelerator reads or writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HardwareHeader {
    pub cf: ColorFormat,
    pub w: u32,
    pub h: u32,
    /// Bytes per row.
    pub stride: u32,
    /// Constant color (ABGR8888) used when there is no source buffer.
    pub color: u32,
    /// Offset of the picture inside the output window; centers shrunk content.
    pub min_x: u32,
    pub min_y: u32,
}

impl HardwareHeader {
    pub fn new(cf: ColorFormat, w: u32, h: u32, stride: u32) -> Self {
        Self { cf, w, h, stride, color: 0xFFFF_FFFF, min_x: 0, min_y: 0 }
    }

    /// Constant-color source of `w × h` pixels.
    pub fn solid(w: u32, h: u32, color: Color32) -> Self {
        Self {
            color: color.to_abgr8888(),
            ..Self::new(ColorFormat::Argb8888, w, h, w * 4)
        }
    }
}

/// Everything the engine needs to run one transfer.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// `None` draws the source header's constant color.
    pub src: Option<DmaAddr>,
    pub dest: DmaAddr,
    pub src_header: HardwareHeader,
    pub dest_header: HardwareHeader,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Clockwise degrees: 0, 90, 180 or 270.
    pub angle: u32,
    /// Below [`Opa::MAX`] the source is composited over the destination.
    pub opa: Opa,
}

impl TransferConfig {
    /// Unscaled, unrotated transfer.
    pub fn new(src: Option<DmaAddr>, src_header: HardwareHeader, dest: DmaAddr, dest_header: HardwareHeader, opa: Opa) -> Self {
        Self { src, dest, src_header, dest_header, scale_x: 1.0, scale_y: 1.0, angle: 0, opa }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The completion interrupt did not arrive in time.
    Stalled { timeout: Duration },
    /// The completion channel closed while waiting.
    Disconnected,
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Stalled { timeout } => {
                write!(f, "accelerator did not signal completion within {timeout:?}")
            }
            TransferError::Disconnected => write!(f, "accelerator completion channel closed"),
        }
    }
}

impl Error for TransferError {}

/// Programs the accelerator and blocks until it reports completion.
///
/// Concurrent callers are serialized by a single transfer slot.
pub struct TransferEngine {
    hw: Arc<dyn PpeHardware>,
    cache: Arc<dyn CacheOps>,
    slot: BinarySemaphore,
    done_tx: Sender<()>,
    done_rx: Mutex<Receiver<()>>,
    timeout: Option<Duration>,
}

impl TransferEngine {
    pub fn new(hw: Arc<dyn PpeHardware>, cache: Arc<dyn CacheOps>, timeout: Option<Duration>) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            hw,
            cache,
            slot: BinarySemaphore::available(),
            done_tx,
            done_rx: Mutex::new(done_rx),
            timeout,
        }
    }

    /// Runs one transfer to completion.
    pub fn transfer(&self, config: &TransferConfig) -> Result<(), TransferError> {
        self.slot.take();
        let result = self.program_and_wait(config);
        self.slot.give();
        result
    }

    fn program_and_wait(&self, config: &TransferConfig) -> Result<(), TransferError> {
        let src = &config.src_header;
        let dst = &config.dest_header;

        let mut input = InputLayerConfig {
            source: config.src.clone().map_or(PicSource::Const, PicSource::Dma),
            pic_width: src.w,
            pic_height: src.h,
            format: src.cf.into(),
            line_len: src.stride,
            const_abgr8888: src.color,
            alpha: 0xFF,
            interp: Interp::NearestNeighbor,
            win_min_x: src.min_x,
            win_min_y: src.min_y,
            win_max_x: dst.w,
            win_max_y: dst.h,
            scale_x: config.scale_x,
            scale_y: config.scale_y,
            angle: 0,
        };
        // Only layer 1 rotates, and it is the background whenever we blend.
        if config.angle != 0 && !src.cf.has_alpha() {
            input.angle = config.angle;
        }

        let blended = config.opa < Opa::MAX;
        // A constant source already carries its opacity in the color.
        if blended && config.src.is_some() && config.opa > Opa::TRANSP {
            input.alpha = config.opa.0;
        }
        let top = if blended {
            let background = InputLayerConfig {
                source: PicSource::Dma(config.dest.clone()),
                pic_width: dst.w,
                pic_height: dst.h,
                format: dst.cf.into(),
                line_len: dst.stride,
                win_max_x: dst.w,
                win_max_y: dst.h,
                ..InputLayerConfig::default()
            };
            self.hw.init_input_layer(InputLayer::Layer1, &background);
            InputLayer::Layer2
        } else {
            InputLayer::Layer1
        };
        self.hw.init_input_layer(top, &input);

        let (blk_width, blk_height) = if matches!(input.angle, 90 | 270) {
            (BLOCK_ALIGN, BLOCK_ALIGN)
        } else {
            (dst.w, dst.h)
        };
        let result = ResultLayerConfig {
            pic_width: dst.w,
            pic_height: dst.h,
            format: dst.cf.into(),
            line_len: dst.stride,
            bg_src: BackgroundSource::Layer1,
            const_bg: 0xFFFF_FFFF,
            blk_width,
            blk_height,
            ..ResultLayerConfig::new(config.dest.clone())
        };
        self.hw.init_result_layer(&result);

        self.cache.clean_invalidate_all();

        let layers = if blended {
            LayerEnable::LAYER1 | LayerEnable::LAYER2
        } else {
            LayerEnable::LAYER1
        };
        self.hw.enable_layers(layers);

        let done = lock(&self.done_rx);
        // Drop completions left over from a transfer that timed out.
        while done.try_recv().is_ok() {}

        self.hw.register_irq(completion_handler(Arc::downgrade(&self.hw), self.done_tx.clone()));
        self.hw.set_irq_mask(PpeIrq::ALL_OVER, true);
        self.hw.start();

        match self.timeout {
            None => done.recv().map_err(|_| TransferError::Disconnected),
            Some(timeout) => done.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => TransferError::Stalled { timeout },
                RecvTimeoutError::Disconnected => TransferError::Disconnected,
            }),
        }
    }
}

/// Interrupt handler: acknowledges "all layers over" and posts completion.
fn completion_handler(hw: Weak<dyn PpeHardware>, done: Sender<()>) -> IrqHandler {
    Arc::new(move || {
        let Some(hw) = hw.upgrade() else {
            return;
        };
        if hw.irq_status().contains(PpeIrq::ALL_OVER) {
            hw.clear_irq(PpeIrq::ALL_OVER);
            let _ = done.send(());
        }
    })
}

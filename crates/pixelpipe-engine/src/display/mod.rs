//! Display output driver.
//!
//! The panel is scanned out by the LCD controller's DMA from a framebuffer in
//! memory. A new frame is published in three steps:
//!
//! ```text
//! publish_frame   clean cache, arm refresh
//! LINE_HIT irq    program new address into shadow registers, request reload
//! FRAME_START irq reload has taken effect, disarm, notify vblank callback
//! ```
//!
//! The address only changes at a frame boundary, so a frame is never torn.

mod convert;

pub use convert::convert_rgb888_to_bgr888;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use anyhow::{Result, ensure};

use crate::draw::{BufHeader, DmaAddr, DrawBuf};
use crate::hal::{CacheOps, LcdcHardware, LcdcIrq, PanelConfig};
use crate::paint::{Color32, ColorFormat};
use crate::sync::lock;

/// Callback run at every frame start.
pub type VblankCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct State {
    /// Published, waiting for the line interrupt.
    pending: Option<DrawBuf>,
    /// In the shadow registers, waiting for the frame boundary.
    programmed: Option<DrawBuf>,
    /// Being scanned out.
    current: Option<DrawBuf>,
}

struct Shared {
    state: Mutex<State>,
    vblank: Mutex<Option<VblankCallback>>,
    frames: AtomicU64,
    underflows: AtomicU64,
}

/// Drives one RGB panel through an [`LcdcHardware`] controller.
pub struct DisplayDriver {
    hw: Arc<dyn LcdcHardware>,
    cache: Arc<dyn CacheOps>,
    panel: PanelConfig,
    shared: Arc<Shared>,
}

impl DisplayDriver {
    /// Initializes the controller for `panel` and starts scanout.
    ///
    /// ARGB8888 panels get a driver-owned framebuffer that is scanned out
    /// until the first frame is published.
    pub fn new(hw: Arc<dyn LcdcHardware>, cache: Arc<dyn CacheOps>, panel: PanelConfig) -> Result<Self> {
        ensure!(panel.width > 0 && panel.height > 0, "panel has no pixels: {}x{}", panel.width, panel.height);
        ensure!(
            panel.line_interrupt < panel.height,
            "line interrupt {} outside panel height {}",
            panel.line_interrupt,
            panel.height
        );

        hw.enable(false);
        hw.init_rgb(&panel);
        hw.set_dma_burst(panel.dma_burst);

        let mut current = None;
        if panel.format == ColorFormat::Argb8888 {
            let fb = DrawBuf::new(BufHeader::new(panel.width, panel.height, panel.format));
            fb.clear(Color32::transparent());
            let addr = fb.addr(0, 0);
            cache.clean(&addr, panel.frame_size());
            hw.set_dma_image(addr);
            hw.shadow_reload();
            current = Some(fb);
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(State { current, ..State::default() }),
            vblank: Mutex::new(None),
            frames: AtomicU64::new(0),
            underflows: AtomicU64::new(0),
        });

        let weak_hw: Weak<dyn LcdcHardware> = Arc::downgrade(&hw);
        let weak_shared = Arc::downgrade(&shared);
        hw.register_irq(Arc::new(move || {
            if let (Some(hw), Some(shared)) = (weak_hw.upgrade(), weak_shared.upgrade()) {
                on_irq(hw.as_ref(), &shared);
            }
        }));
        hw.set_line_irq_position(panel.line_interrupt);
        hw.set_irq_mask(
            LcdcIrq::FRAME_DONE | LcdcIrq::LINE_HIT | LcdcIrq::FRAME_START | LcdcIrq::DMA_UNDERFLOW,
            true,
        );
        hw.enable(true);

        log::info!(
            "display {}x{} {:?} @ {} Hz, line irq at {}",
            panel.width,
            panel.height,
            panel.format,
            panel.refresh_hz,
            panel.line_interrupt
        );
        Ok(Self { hw, cache, panel, shared })
    }

    /// Panel width and height in pixels.
    #[inline]
    pub fn info(&self) -> (u32, u32) {
        (self.panel.width, self.panel.height)
    }

    #[inline]
    pub fn panel(&self) -> &PanelConfig {
        &self.panel
    }

    /// Hands `buf` to scanout from the next frame boundary on.
    ///
    /// The caller must not write to `buf` until the vblank callback has run.
    /// Publishing again before the line interrupt replaces the pending frame.
    /// A frame already programmed into the controller is still shown first.
    pub fn publish_frame(&self, buf: DrawBuf) -> Result<()> {
        let h = buf.header();
        ensure!(
            h.w == self.panel.width && h.h == self.panel.height && h.cf == self.panel.format,
            "frame {}x{} {:?} does not match panel {}x{} {:?}",
            h.w,
            h.h,
            h.cf,
            self.panel.width,
            self.panel.height,
            self.panel.format
        );

        self.cache.clean(&buf.addr(0, 0), h.data_size());
        lock(&self.shared.state).pending = Some(buf);
        Ok(())
    }

    /// Installs the frame-start callback, replacing any previous one.
    pub fn register_vblank_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        *lock(&self.shared.vblank) = Some(Arc::new(callback));
    }

    /// `true` from [`publish_frame`](Self::publish_frame) until the frame
    /// is being scanned out.
    pub fn refresh_pending(&self) -> bool {
        let state = lock(&self.shared.state);
        state.pending.is_some() || state.programmed.is_some()
    }

    /// Buffer currently being scanned out.
    pub fn framebuffer(&self) -> Option<DrawBuf> {
        lock(&self.shared.state).current.clone()
    }

    /// Frame-start interrupts seen so far.
    pub fn frames(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    pub fn underflows(&self) -> u64 {
        self.shared.underflows.load(Ordering::Relaxed)
    }
}

impl Drop for DisplayDriver {
    fn drop(&mut self) {
        self.hw.set_irq_mask(LcdcIrq::all(), false);
        self.hw.enable(false);
    }
}

fn on_irq(hw: &dyn LcdcHardware, shared: &Shared) {
    let status = hw.irq_status();
    hw.clear_irq(status);

    if status.contains(LcdcIrq::LINE_HIT) {
        let mut state = lock(&shared.state);
        if let Some(buf) = state.pending.take() {
            hw.set_dma_image(DmaAddr::new(buf.clone(), 0));
            hw.shadow_reload();
            state.programmed = Some(buf);
        }
    }

    if status.contains(LcdcIrq::FRAME_START) {
        {
            let mut state = lock(&shared.state);
            if let Some(buf) = state.programmed.take() {
                state.current = Some(buf);
            }
        }
        shared.frames.fetch_add(1, Ordering::Relaxed);
        let callback = lock(&shared.vblank).clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    if status.contains(LcdcIrq::FRAME_DONE) {
        log::trace!("lcdc frame done");
    }
    if status.contains(LcdcIrq::DMA_UNDERFLOW) {
        shared.underflows.fetch_add(1, Ordering::Relaxed);
        log::warn!("lcdc dma underflow");
    }
}

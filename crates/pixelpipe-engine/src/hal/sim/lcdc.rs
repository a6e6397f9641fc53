use std::sync::{Arc, Mutex};

use crate::hal::{DmaAddr, IrqHandler, LcdcHardware, LcdcIrq, PanelConfig};
use crate::sync::lock;

#[derive(Debug, Default)]
struct Regs {
    enabled: bool,
    panel: Option<PanelConfig>,
    dma_burst: u32,
    line_irq: u32,
    mask: LcdcIrq,
    status: LcdcIrq,
    active: Option<DmaAddr>,
    shadow: Option<DmaAddr>,
    reload_pending: bool,
    frames: u64,
    reloads: u64,
}

struct Inner {
    regs: Mutex<Regs>,
    irq: Mutex<Option<IrqHandler>>,
}

/// Simulated LCD controller.
///
/// Nothing happens on its own: each [`scan_frame`](Self::scan_frame) call plays
/// one refresh period and raises its interrupts in scanout order.
#[derive(Clone)]
pub struct SimLcdc {
    inner: Arc<Inner>,
}

impl SimLcdc {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                regs: Mutex::new(Regs::default()),
                irq: Mutex::new(None),
            }),
        }
    }

    /// Plays one frame: applies a pending shadow reload at the frame boundary,
    /// then raises frame-start, line-hit and frame-done.
    ///
    /// Returns `false` while the controller is disabled.
    pub fn scan_frame(&self) -> bool {
        {
            let mut regs = lock(&self.inner.regs);
            if !regs.enabled {
                return false;
            }
            if regs.reload_pending {
                regs.active = regs.shadow.clone();
                regs.reload_pending = false;
                regs.reloads += 1;
            }
            regs.frames += 1;
        }
        self.raise(LcdcIrq::FRAME_START);
        self.raise(LcdcIrq::LINE_HIT);
        self.raise(LcdcIrq::FRAME_DONE);
        true
    }

    pub fn inject_underflow(&self) {
        self.raise(LcdcIrq::DMA_UNDERFLOW);
    }

    /// Address currently being scanned out.
    pub fn active_image(&self) -> Option<DmaAddr> {
        lock(&self.inner.regs).active.clone()
    }

    pub fn frames(&self) -> u64 {
        lock(&self.inner.regs).frames
    }

    /// Number of shadow reloads that took effect.
    pub fn reloads(&self) -> u64 {
        lock(&self.inner.regs).reloads
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.inner.regs).enabled
    }

    pub fn panel(&self) -> Option<PanelConfig> {
        lock(&self.inner.regs).panel.clone()
    }

    pub fn line_irq_position(&self) -> u32 {
        lock(&self.inner.regs).line_irq
    }

    pub fn dma_burst(&self) -> u32 {
        lock(&self.inner.regs).dma_burst
    }

    fn raise(&self, irq: LcdcIrq) {
        let fire = {
            let mut regs = lock(&self.inner.regs);
            regs.status |= irq;
            regs.mask.intersects(irq)
        };
        if fire {
            let handler = lock(&self.inner.irq).clone();
            if let Some(handler) = handler {
                handler();
            }
        }
    }
}

impl Default for SimLcdc {
    fn default() -> Self {
        Self::new()
    }
}

impl LcdcHardware for SimLcdc {
    fn enable(&self, on: bool) {
        lock(&self.inner.regs).enabled = on;
    }

    fn init_rgb(&self, panel: &PanelConfig) {
        lock(&self.inner.regs).panel = Some(panel.clone());
    }

    fn set_dma_burst(&self, size: u32) {
        lock(&self.inner.regs).dma_burst = size;
    }

    fn register_irq(&self, handler: IrqHandler) {
        *lock(&self.inner.irq) = Some(handler);
    }

    fn set_line_irq_position(&self, line: u32) {
        lock(&self.inner.regs).line_irq = line;
    }

    fn set_irq_mask(&self, irq: LcdcIrq, enable: bool) {
        lock(&self.inner.regs).mask.set(irq, enable);
    }

    fn irq_status(&self) -> LcdcIrq {
        lock(&self.inner.regs).status
    }

    fn clear_irq(&self, irq: LcdcIrq) {
        lock(&self.inner.regs).status.remove(irq);
    }

    fn set_dma_image(&self, addr: DmaAddr) {
        lock(&self.inner.regs).shadow = Some(addr);
    }

    fn shadow_reload(&self) {
        lock(&self.inner.regs).reload_pending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{BufHeader, DrawBuf};
    use crate::paint::ColorFormat;

    #[test]
    fn reload_applies_at_next_frame_boundary() {
        let lcdc = SimLcdc::new();
        lcdc.enable(true);
        let buf = DrawBuf::new(BufHeader::new(4, 4, ColorFormat::Rgb565));

        lcdc.set_dma_image(buf.addr(0, 0));
        assert!(lcdc.active_image().is_none());
        lcdc.shadow_reload();
        assert!(lcdc.active_image().is_none());

        assert!(lcdc.scan_frame());
        assert_eq!(lcdc.active_image(), Some(buf.addr(0, 0)));
        assert_eq!(lcdc.reloads(), 1);
    }

    #[test]
    fn disabled_controller_does_not_scan() {
        let lcdc = SimLcdc::new();
        assert!(!lcdc.scan_frame());
        assert_eq!(lcdc.frames(), 0);
    }

    #[test]
    fn interrupts_fire_in_scanout_order() {
        let lcdc = SimLcdc::new();
        lcdc.enable(true);
        lcdc.set_irq_mask(LcdcIrq::all(), true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (hw, log) = (lcdc.clone(), Arc::clone(&seen));
        lcdc.register_irq(Arc::new(move || {
            let st = hw.irq_status();
            hw.clear_irq(st);
            lock(&log).push(st);
        }));

        lcdc.scan_frame();
        assert_eq!(*lock(&seen), vec![LcdcIrq::FRAME_START, LcdcIrq::LINE_HIT, LcdcIrq::FRAME_DONE]);
    }
}

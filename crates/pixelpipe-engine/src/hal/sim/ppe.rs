use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::hal::{
    InputLayer, InputLayerConfig, IrqHandler, LayerEnable, PicSource, PpeHardware, PpeIrq,
    ResultLayerConfig,
};
use crate::paint::Color32;
use crate::sync::lock;

/// When a started transfer raises its completion interrupt.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Completion {
    /// Pixels are written and the interrupt fires from inside `start`.
    #[default]
    Immediate,
    /// The transfer stays in flight until [`SimPpe::complete_next`].
    Manual,
}

/// Registers captured when a transfer was started.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    /// Enabled input layers with their configuration, layer 1 first.
    pub inputs: Vec<(InputLayer, InputLayerConfig)>,
    pub result: ResultLayerConfig,
    pub enabled: LayerEnable,
}

impl TransferRecord {
    pub fn layer(&self, layer: InputLayer) -> Option<&InputLayerConfig> {
        self.inputs.iter().find(|(l, _)| *l == layer).map(|(_, c)| c)
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.inputs.len()
    }
}

#[derive(Debug, Default)]
struct Regs {
    inputs: [Option<InputLayerConfig>; 3],
    result: Option<ResultLayerConfig>,
    enabled: LayerEnable,
    mask: PpeIrq,
    status: PpeIrq,
}

struct Inner {
    completion: Completion,
    regs: Mutex<Regs>,
    irq: Mutex<Option<IrqHandler>>,
    in_flight: Mutex<VecDeque<TransferRecord>>,
    history: Mutex<Vec<TransferRecord>>,
}

/// Simulated pixel-processing engine.
///
/// Clones share the same device.
#[derive(Clone)]
pub struct SimPpe {
    inner: Arc<Inner>,
}

impl SimPpe {
    pub fn new(completion: Completion) -> Self {
        Self {
            inner: Arc::new(Inner {
                completion,
                regs: Mutex::new(Regs::default()),
                irq: Mutex::new(None),
                in_flight: Mutex::new(VecDeque::new()),
                history: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Finishes the oldest in-flight transfer. Returns `false` if none was running.
    pub fn complete_next(&self) -> bool {
        let next = lock(&self.inner.in_flight).pop_front();
        match next {
            Some(record) => {
                self.finish(&record);
                true
            }
            None => false,
        }
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }

    /// Every transfer started so far, oldest first.
    pub fn history(&self) -> Vec<TransferRecord> {
        lock(&self.inner.history).clone()
    }

    pub fn transfer_count(&self) -> usize {
        lock(&self.inner.history).len()
    }

    pub fn last_transfer(&self) -> Option<TransferRecord> {
        lock(&self.inner.history).last().cloned()
    }

    fn finish(&self, record: &TransferRecord) {
        composite(record);
        self.raise(PpeIrq::ALL_OVER | PpeIrq::FRAME_OVER);
    }

    fn raise(&self, irq: PpeIrq) {
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

impl Default for SimPpe {
    fn default() -> Self {
        Self::new(Completion::Immediate)
    }
}

impl PpeHardware for SimPpe {
    fn init_input_layer(&self, layer: InputLayer, config: &InputLayerConfig) {
        lock(&self.inner.regs).inputs[layer.index()] = Some(config.clone());
    }

    fn init_result_layer(&self, config: &ResultLayerConfig) {
        lock(&self.inner.regs).result = Some(config.clone());
    }

    fn enable_layers(&self, layers: LayerEnable) {
        lock(&self.inner.regs).enabled = layers;
    }

    fn register_irq(&self, handler: IrqHandler) {
        *lock(&self.inner.irq) = Some(handler);
    }

    fn set_irq_mask(&self, irq: PpeIrq, enable: bool) {
        lock(&self.inner.regs).mask.set(irq, enable);
    }

    fn irq_status(&self) -> PpeIrq {
        lock(&self.inner.regs).status
    }

    fn clear_irq(&self, irq: PpeIrq) {
        lock(&self.inner.regs).status.remove(irq);
    }

    fn start(&self) {
        let record = {
            let regs = lock(&self.inner.regs);
            let Some(result) = regs.result.clone() else {
                log::warn!("sim ppe: started without a result layer");
                return;
            };
            let inputs = [InputLayer::Layer1, InputLayer::Layer2, InputLayer::Layer3]
                .into_iter()
                .filter(|l| regs.enabled.contains(l.enable_bit()))
                .filter_map(|l| regs.inputs[l.index()].clone().map(|c| (l, c)))
                .collect();
            TransferRecord { inputs, result, enabled: regs.enabled }
        };

        lock(&self.inner.history).push(record.clone());

        match self.inner.completion {
            Completion::Immediate => self.finish(&record),
            Completion::Manual => lock(&self.inner.in_flight).push_back(record),
        }
    }
}

/// One input layer with its pixels copied out of the source buffer.
struct Sampler<'a> {
    config: &'a InputLayerConfig,
    pixels: Option<Vec<u8>>,
}

impl<'a> Sampler<'a> {
    fn new(config: &'a InputLayerConfig) -> Self {
        let pixels = match &config.source {
            PicSource::Dma(addr) => Some(addr.buf.read().get(addr.offset..).unwrap_or_default().to_vec()),
            PicSource::Const => None,
        };
        Self { config, pixels }
    }

    /// Layer pixel landing on result pixel `(u, v)`, if the layer covers it.
    fn sample(&self, u: u32, v: u32) -> Option<Color32> {
        let c = self.config;
        if u < c.win_min_x || v < c.win_min_y || u >= c.win_max_x || v >= c.win_max_y {
            return None;
        }
        if c.scale_x <= 0.0 || c.scale_y <= 0.0 {
            return None;
        }
        let sx = ((u - c.win_min_x) as f32 / c.scale_x) as u32;
        let sy = ((v - c.win_min_y) as f32 / c.scale_y) as u32;

        let (w, h) = (c.pic_width, c.pic_height);
        let (px, py) = match c.angle {
            90 => (sy, h.checked_sub(1 + sx)?),
            180 => (w.checked_sub(1 + sx)?, h.checked_sub(1 + sy)?),
            270 => (w.checked_sub(1 + sy)?, sx),
            _ => (sx, sy),
        };
        if px >= w || py >= h {
            return None;
        }

        let sampled = match &self.pixels {
            None => Color32::from_abgr8888(c.const_abgr8888),
            Some(data) => {
                let cf = c.format.color_format();
                let off = py as usize * c.line_len as usize + px as usize * cf.bytes_per_pixel();
                cf.read(data.get(off..off + cf.bytes_per_pixel())?)
            }
        };
        let a = (sampled.a as u32 * c.alpha as u32 + 127) / 255;
        Some(Color32 { a: a as u8, ..sampled })
    }
}

/// Writes the result of `record` into its destination buffer.
///
/// With layer 2 enabled, layer 2 is blended over layer 1 (the background);
/// otherwise layer 1 is written directly.
fn composite(record: &TransferRecord) {
    let (top, bg) = if record.enabled.contains(LayerEnable::LAYER2) {
        (record.layer(InputLayer::Layer2), record.layer(InputLayer::Layer1))
    } else {
        (record.layer(InputLayer::Layer1), None)
    };
    let Some(top) = top else {
        return;
    };

    // Sources may alias the destination; copy them before locking it.
    let top = Sampler::new(top);
    let bg = bg.map(Sampler::new);

    let r = &record.result;
    let cf = r.format.color_format();
    let bpp = cf.bytes_per_pixel();
    let (bw, bh) = (r.blk_width.max(1), r.blk_height.max(1));
    let mut dst = r.dest.buf.write();

    for by in (0..r.pic_height).step_by(bh as usize) {
        for bx in (0..r.pic_width).step_by(bw as usize) {
            for v in by..(by + bh).min(r.pic_height) {
                for u in bx..(bx + bw).min(r.pic_width) {
                    let off = r.dest.offset + v as usize * r.line_len as usize + u as usize * bpp;
                    let Some(px) = dst.get_mut(off..off + bpp) else {
                        continue;
                    };
                    let out = match (&bg, top.sample(u, v)) {
                        (Some(bg), Some(fg)) => {
                            let under = bg.sample(u, v).unwrap_or_else(|| cf.read(px));
                            fg.over(under)
                        }
                        (Some(bg), None) => match bg.sample(u, v) {
                            Some(under) => under,
                            None => continue,
                        },
                        (None, Some(fg)) => fg,
                        (None, None) => continue,
                    };
                    cf.write(px, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{BufHeader, DrawBuf};
    use crate::hal::PpeFormat;
    use crate::paint::ColorFormat;

    fn dest(w: u32, h: u32) -> DrawBuf {
        DrawBuf::new(BufHeader::new(w, h, ColorFormat::Argb8888))
    }

    fn result(buf: &DrawBuf, w: u32, h: u32) -> ResultLayerConfig {
        let mut r = ResultLayerConfig::new(buf.addr(0, 0));
        r.pic_width = w;
        r.pic_height = h;
        r.format = PpeFormat::Argb8888;
        r.line_len = buf.header().stride;
        r.blk_width = w;
        r.blk_height = h;
        r
    }

    fn run(ppe: &SimPpe, inputs: &[(InputLayer, InputLayerConfig)], r: &ResultLayerConfig) {
        let mut en = LayerEnable::empty();
        for (l, c) in inputs {
            ppe.init_input_layer(*l, c);
            en |= l.enable_bit();
        }
        ppe.init_result_layer(r);
        ppe.enable_layers(en);
        ppe.start();
    }

    // ── compositing ───────────────────────────────────────────────────────

    #[test]
    fn const_layer_fills_window() {
        let ppe = SimPpe::default();
        let buf = dest(4, 4);
        let l1 = InputLayerConfig {
            pic_width: 4,
            pic_height: 4,
            const_abgr8888: 0xFF00_00FF,
            win_min_x: 1,
            win_max_x: 4,
            win_max_y: 4,
            ..Default::default()
        };
        run(&ppe, &[(InputLayer::Layer1, l1)], &result(&buf, 4, 4));

        assert_eq!(buf.pixel(0, 0), Some(Color32::transparent()));
        assert_eq!(buf.pixel(1, 0), Some(Color32::new(0xff, 0, 0, 0xff)));
        assert_eq!(buf.pixel(3, 3), Some(Color32::new(0xff, 0, 0, 0xff)));
    }

    #[test]
    fn rotation_90_moves_corner() {
        let ppe = SimPpe::default();
        let src = DrawBuf::new(BufHeader::new(2, 2, ColorFormat::Argb8888));
        src.clear(Color32::new(0, 0, 0, 0xff));
        {
            let mut d = src.write();
            ColorFormat::Argb8888.write(&mut d[0..4], Color32::new(0xff, 0xff, 0xff, 0xff));
        }
        let buf = dest(2, 2);
        let l1 = InputLayerConfig {
            source: PicSource::Dma(src.addr(0, 0)),
            pic_width: 2,
            pic_height: 2,
            line_len: 8,
            win_max_x: 2,
            win_max_y: 2,
            angle: 90,
            ..Default::default()
        };
        run(&ppe, &[(InputLayer::Layer1, l1)], &result(&buf, 2, 2));

        // Top-left of the source ends up top-right after a clockwise turn.
        assert_eq!(buf.pixel(1, 0), Some(Color32::new(0xff, 0xff, 0xff, 0xff)));
        assert_eq!(buf.pixel(0, 0), Some(Color32::new(0, 0, 0, 0xff)));
    }

    #[test]
    fn layer2_blends_over_background() {
        let ppe = SimPpe::default();
        let buf = dest(2, 1);
        buf.clear(Color32::new(0, 0, 0xff, 0xff));
        let bg = InputLayerConfig {
            source: PicSource::Dma(buf.addr(0, 0)),
            pic_width: 2,
            pic_height: 1,
            line_len: 8,
            win_max_x: 2,
            win_max_y: 1,
            ..Default::default()
        };
        let fg = InputLayerConfig {
            pic_width: 2,
            pic_height: 1,
            const_abgr8888: Color32::new(0xff, 0, 0, 128).to_abgr8888(),
            win_max_x: 2,
            win_max_y: 1,
            ..Default::default()
        };
        run(&ppe, &[(InputLayer::Layer1, bg), (InputLayer::Layer2, fg)], &result(&buf, 2, 1));

        let px = buf.pixel(0, 0).unwrap();
        assert_eq!((px.r, px.b, px.a), (128, 127, 255));
    }

    #[test]
    fn layer_alpha_scales_opaque_source() {
        let ppe = SimPpe::default();
        let buf = dest(1, 1);
        buf.clear(Color32::new(0, 0, 0xff, 0xff));
        let src = DrawBuf::new(BufHeader::new(1, 1, ColorFormat::Rgb565));
        src.clear(Color32::new(0xff, 0, 0, 0xff));
        let bg = InputLayerConfig {
            source: PicSource::Dma(buf.addr(0, 0)),
            pic_width: 1,
            pic_height: 1,
            line_len: 4,
            win_max_x: 1,
            win_max_y: 1,
            ..Default::default()
        };
        let fg = InputLayerConfig {
            source: PicSource::Dma(src.addr(0, 0)),
            pic_width: 1,
            pic_height: 1,
            format: PpeFormat::Rgb565,
            line_len: 2,
            alpha: 128,
            win_max_x: 1,
            win_max_y: 1,
            ..Default::default()
        };
        run(&ppe, &[(InputLayer::Layer1, bg), (InputLayer::Layer2, fg)], &result(&buf, 1, 1));

        let px = buf.pixel(0, 0).unwrap();
        assert_eq!((px.r, px.b, px.a), (128, 127, 255));
    }

    // ── completion ────────────────────────────────────────────────────────

    #[test]
    fn manual_completion_defers_pixels_and_irq() {
        let ppe = SimPpe::new(Completion::Manual);
        ppe.set_irq_mask(PpeIrq::ALL_OVER, true);
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        ppe.register_irq(Arc::new(move || *lock(&h) += 1));

        let buf = dest(1, 1);
        let l1 = InputLayerConfig { pic_width: 1, pic_height: 1, win_max_x: 1, win_max_y: 1, ..Default::default() };
        run(&ppe, &[(InputLayer::Layer1, l1)], &result(&buf, 1, 1));

        assert_eq!(ppe.in_flight(), 1);
        assert_eq!(*lock(&hits), 0);
        assert_eq!(buf.pixel(0, 0), Some(Color32::transparent()));

        assert!(ppe.complete_next());
        assert_eq!(*lock(&hits), 1);
        assert!(ppe.irq_status().contains(PpeIrq::ALL_OVER));
        assert_eq!(buf.pixel(0, 0), Some(Color32::new(0xff, 0xff, 0xff, 0xff)));
        assert!(!ppe.complete_next());
    }

    #[test]
    fn masked_irq_does_not_fire() {
        let ppe = SimPpe::default();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        ppe.register_irq(Arc::new(move || *lock(&h) += 1));
        let buf = dest(1, 1);
        run(&ppe, &[(InputLayer::Layer1, InputLayerConfig::default())], &result(&buf, 1, 1));
        assert_eq!(*lock(&hits), 0);
        assert_eq!(ppe.transfer_count(), 1);
    }
}

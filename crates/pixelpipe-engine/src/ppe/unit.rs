use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result, anyhow};

use crate::draw::{DispatchCtx, DispatchOutcome, DispatchSignal, DrawTask, DrawUnit, Evaluation, Layer, UnitId};
use crate::hal::{CacheOps, PpeHardware};

use super::transfer::TransferEngine;
use super::worker::{self, Executor, WorkerContext};
use super::{ExecutionMode, PPE_UNIT_ID, PpeConfig, PpeStats, PpeStatsSnapshot, evaluate};

/// Draw unit backed by the pixel-processing engine.
///
/// At most one task is in progress at a time. In threaded mode the unit owns a
/// worker thread for its whole lifetime; [`DrawUnit::teardown`] (or drop)
/// stops it after the current task.
pub struct PpeUnit {
    config: PpeConfig,
    executor: Arc<Executor>,
    worker: Arc<WorkerContext>,
    thread: Option<JoinHandle<()>>,
    stats: Arc<PpeStats>,
}

impl PpeUnit {
    /// Creates the unit and, in threaded mode, starts its worker.
    ///
    /// `signal` is raised every time a task finishes.
    pub fn new(
        hw: Arc<dyn PpeHardware>,
        cache: Arc<dyn CacheOps>,
        config: PpeConfig,
        signal: Arc<DispatchSignal>,
    ) -> Result<Self> {
        let stats = Arc::new(PpeStats::default());
        let executor = Arc::new(Executor {
            engine: TransferEngine::new(hw, Arc::clone(&cache), config.completion_timeout),
            cache,
            stats: Arc::clone(&stats),
            config: config.clone(),
        });
        let worker = Arc::new(WorkerContext::new());

        let thread = match config.execution {
            ExecutionMode::Threaded => Some(
                worker::spawn(&config, Arc::clone(&worker), Arc::clone(&executor), signal)
                    .with_context(|| format!("failed to spawn worker thread {:?}", config.thread_name))?,
            ),
            ExecutionMode::Inline => None,
        };

        log::info!(
            "ppe draw unit ready ({:?}, ceiling {}, min fill {}px)",
            config.execution, config.preference_ceiling, config.min_fill_size
        );

        Ok(Self { config, executor, worker, thread, stats })
    }

    pub fn config(&self) -> &PpeConfig {
        &self.config
    }

    pub fn stats(&self) -> PpeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Counters that stay readable after the unit is boxed into a renderer.
    pub fn stats_handle(&self) -> Arc<PpeStats> {
        Arc::clone(&self.stats)
    }

    /// `true` while a task is assigned to the worker.
    pub fn is_busy(&self) -> bool {
        self.worker.is_busy()
    }

    fn stop_worker(&mut self) -> Result<()> {
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };
        self.worker.request_exit();
        handle.join().map_err(|_| anyhow!("ppe worker thread panicked"))
    }
}

impl DrawUnit for PpeUnit {
    fn id(&self) -> UnitId {
        PPE_UNIT_ID
    }

    fn name(&self) -> &str {
        "PPE"
    }

    fn evaluate(&self, task: &DrawTask) -> Evaluation {
        evaluate::evaluate(task, &self.config)
    }

    fn dispatch(&mut self, ctx: &DispatchCtx<'_>, layer: &Arc<Layer>) -> DispatchOutcome {
        if self.worker.is_busy() {
            return DispatchOutcome::Busy;
        }
        if self.config.execution == ExecutionMode::Threaded && self.thread.is_none() {
            // Torn down.
            return DispatchOutcome::Idle;
        }

        let Some(task) = ctx.pool.next_unclaimed(layer, None, PPE_UNIT_ID) else {
            return DispatchOutcome::Idle;
        };
        if task.preference().unit != Some(PPE_UNIT_ID) {
            return DispatchOutcome::Idle;
        }

        if layer.ensure_buffer(ctx.allocator).is_none() {
            log::warn!("ppe: no buffer for layer {}, retrying later", layer.id().0);
            return DispatchOutcome::Idle;
        }
        if !task.try_claim() {
            return DispatchOutcome::Idle;
        }

        log::debug!("ppe: claimed task {} ({})", task.id().0, task.kind().name());
        match self.config.execution {
            ExecutionMode::Threaded => self.worker.assign(task),
            ExecutionMode::Inline => {
                self.executor.execute(&task);
                worker::complete(&self.worker, &task, ctx.signal);
            }
        }
        DispatchOutcome::Claimed
    }

    fn teardown(&mut self) -> Result<()> {
        self.stop_worker()
    }
}

impl Drop for PpeUnit {
    fn drop(&mut self) {
        if let Err(e) = self.stop_worker() {
            log::error!("{e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Area, Point};
    use crate::draw::shapes::{BorderDsc, FillDsc, ImageDsc, ImageStyle, LayerDsc, LineDsc, MaskRectDsc};
    use crate::draw::{BufHeader, DrawBuf, DrawTaskKind, HeapAllocator, TaskPool, TaskState};
    use crate::hal::sim::{Completion, SimCache, SimPpe};
    use crate::hal::{InputLayer, PicSource};
    use crate::paint::{Color, Color32, ColorFormat, Opa};
    use crate::sw::SoftwareUnit;
    use std::time::{Duration, Instant};

    struct Harness {
        pool: TaskPool,
        alloc: HeapAllocator,
        signal: Arc<DispatchSignal>,
        ppe: SimPpe,
        unit: PpeUnit,
        sw: SoftwareUnit,
    }

    impl Harness {
        fn new(completion: Completion, config: PpeConfig) -> Self {
            Self::with_alloc(completion, config, HeapAllocator::unbounded())
        }

        fn with_alloc(completion: Completion, config: PpeConfig, alloc: HeapAllocator) -> Self {
            let ppe = SimPpe::new(completion);
            let signal = Arc::new(DispatchSignal::new());
            let unit = PpeUnit::new(
                Arc::new(ppe.clone()),
                Arc::new(SimCache::new()),
                config,
                Arc::clone(&signal),
            )
            .unwrap();
            Self { pool: TaskPool::new(), alloc, signal, ppe, unit, sw: SoftwareUnit::new() }
        }

        fn add(&self, layer: &Arc<Layer>, area: Area, kind: DrawTaskKind) -> Arc<DrawTask> {
            let t = self.pool.push(layer, kind, area, layer.buf_area());
            self.sw.evaluate(&t);
            self.unit.evaluate(&t);
            t
        }

        fn dispatch(&mut self, layer: &Arc<Layer>) -> DispatchOutcome {
            let ctx = DispatchCtx { pool: &self.pool, allocator: &self.alloc, signal: &self.signal };
            self.unit.dispatch(&ctx, layer)
        }

        /// Dispatches both units until `layer` has no pending work.
        fn drain(&mut self, layer: &Arc<Layer>) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.pool.pending(layer) > 0 {
                assert!(Instant::now() < deadline, "layer did not drain");
                self.ppe.complete_next();
                let ctx = DispatchCtx { pool: &self.pool, allocator: &self.alloc, signal: &self.signal };
                self.unit.dispatch(&ctx, layer);
                self.sw.dispatch(&ctx, layer);
                self.pool.remove_ready(layer);
                self.signal.wait_timeout(Duration::from_millis(1));
            }
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn solid(color: u32) -> DrawTaskKind {
        DrawTaskKind::Fill(FillDsc::solid(Color::hex(color), Opa::COVER))
    }

    fn rgb565_image(w: u32, h: u32, px: Color32) -> ImageDsc {
        let src = DrawBuf::new(BufHeader::new(w, h, ColorFormat::Rgb565));
        src.clear(px);
        ImageDsc::new(src)
    }

    const RED: Color32 = Color32::new(0xff, 0, 0, 0xff);
    const BLACK: Color32 = Color32::new(0, 0, 0, 0xff);

    // ── dispatch ──────────────────────────────────────────────────────────

    #[test]
    fn second_dispatch_is_busy_until_slot_clears() {
        let mut h = Harness::new(Completion::Manual, PpeConfig::default());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 199, 99));
        let a = h.add(&layer, Area::new(0, 0, 99, 59), solid(0xff0000));
        let b = h.add(&layer, Area::new(100, 0, 199, 59), solid(0x0000ff));

        assert_eq!(h.dispatch(&layer), DispatchOutcome::Claimed);
        assert_eq!(a.state(), TaskState::InProgress);
        assert_eq!(h.dispatch(&layer), DispatchOutcome::Busy);
        assert_eq!(b.state(), TaskState::Queued);

        wait_until(|| h.ppe.in_flight() == 1);
        assert!(h.ppe.complete_next());
        wait_until(|| !h.unit.is_busy());
        assert_eq!(a.state(), TaskState::Ready);

        assert_eq!(h.dispatch(&layer), DispatchOutcome::Claimed);
        h.drain(&layer);
        assert_eq!(b.state(), TaskState::Ready);
        assert_eq!(h.unit.stats().fills, 2);
    }

    #[test]
    fn tasks_routed_to_software_are_left_alone() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let t = h.add(&layer, layer.buf_area(), DrawTaskKind::Border(BorderDsc::new(2, Color::black())));
        assert_eq!(h.dispatch(&layer), DispatchOutcome::Idle);
        assert_eq!(t.state(), TaskState::Queued);
    }

    #[test]
    fn allocation_failure_is_idle_and_retryable() {
        let mut h = Harness::with_alloc(Completion::Immediate, PpeConfig::inline(), HeapAllocator::with_budget(0));
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let t = h.add(&layer, layer.buf_area(), solid(0xffffff));
        assert_eq!(h.dispatch(&layer), DispatchOutcome::Idle);
        assert_eq!(t.state(), TaskState::Queued);
        assert!(layer.draw_buf().is_none());
    }

    #[test]
    fn teardown_joins_worker() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::default());
        assert!(h.unit.thread.is_some());
        h.unit.teardown().unwrap();
        assert!(h.unit.thread.is_none());
        h.unit.teardown().unwrap();
    }

    #[test]
    fn teardown_waits_for_in_flight_task() {
        let mut h = Harness::new(Completion::Manual, PpeConfig::default());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 199, 99));
        let a = h.add(&layer, Area::new(0, 0, 99, 59), solid(0xff0000));
        let b = h.add(&layer, Area::new(100, 0, 199, 59), solid(0x0000ff));
        assert_eq!(h.dispatch(&layer), DispatchOutcome::Claimed);
        wait_until(|| h.ppe.in_flight() == 1);

        let mut unit = h.unit;
        let stopping = std::thread::spawn(move || unit.teardown().map(|()| unit));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!stopping.is_finished());
        assert_eq!(a.state(), TaskState::InProgress);

        assert!(h.ppe.complete_next());
        let unit = stopping.join().unwrap().unwrap();
        assert!(unit.thread.is_none());
        assert_eq!(a.state(), TaskState::Ready);
        assert_eq!(b.state(), TaskState::Queued);
        assert_eq!(h.ppe.transfer_count(), 1);
    }

    #[test]
    fn torn_down_unit_claims_nothing() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::default());
        h.unit.teardown().unwrap();
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let t = h.add(&layer, layer.buf_area(), solid(0xffffff));

        assert_eq!(h.dispatch(&layer), DispatchOutcome::Idle);
        assert_eq!(t.state(), TaskState::Queued);
        assert_eq!(h.ppe.transfer_count(), 0);
    }

    // ── fill ──────────────────────────────────────────────────────────────

    #[test]
    fn solid_fill_reads_back_exact_color() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 199, 99));
        let area = Area::new(10, 10, 109, 69);
        h.add(&layer, area, solid(0xff0000));
        h.drain(&layer);

        let buf = layer.draw_buf().unwrap();
        for y in area.y1..=area.y2 {
            for x in area.x1..=area.x2 {
                assert_eq!(buf.pixel(x as u32, y as u32), Some(RED), "({x}, {y})");
            }
        }
        assert_eq!(buf.pixel(9, 10), Some(BLACK));
        assert_eq!(buf.pixel(110, 69), Some(BLACK));
        assert_eq!(h.ppe.transfer_count(), 1);
        assert_eq!(h.unit.stats().fills, 1);
    }

    #[test]
    fn small_fill_falls_back_to_software() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let t = h.add(&layer, Area::new(0, 0, 9, 9), solid(0xff0000));
        assert_eq!(t.preference().unit, Some(PPE_UNIT_ID));
        h.drain(&layer);

        assert_eq!(h.ppe.transfer_count(), 0);
        assert_eq!(h.unit.stats().sw_fallbacks, 1);
        assert_eq!(layer.draw_buf().unwrap().pixel(9, 9), Some(RED));
    }

    #[test]
    fn stalled_transfer_is_abandoned_after_timeout() {
        let config = PpeConfig::inline().with_completion_timeout(Duration::from_millis(10));
        let mut h = Harness::new(Completion::Manual, config);
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let t = h.add(&layer, layer.buf_area(), solid(0xffffff));

        assert_eq!(h.dispatch(&layer), DispatchOutcome::Claimed);
        assert_eq!(t.state(), TaskState::Ready);
        let stats = h.unit.stats();
        assert_eq!((stats.stalls, stats.transfers), (1, 0));
        assert!(!h.unit.is_busy());
    }

    // ── image ─────────────────────────────────────────────────────────────

    #[test]
    fn half_scale_image_uses_centered_window() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 63, 63));
        let mut dsc = rgb565_image(32, 32, RED);
        dsc.style.scale_x = 128;
        dsc.style.scale_y = 128;
        let t = h.add(&layer, Area::new(0, 0, 31, 31), DrawTaskKind::Image(dsc));
        assert_eq!(t.preference().unit, Some(PPE_UNIT_ID));
        h.drain(&layer);

        let rec = h.ppe.last_transfer().unwrap();
        let l1 = rec.layer(InputLayer::Layer1).unwrap();
        assert_eq!((l1.win_min_x, l1.win_min_y), (8, 8));
        assert_eq!((l1.scale_x, l1.scale_y), (0.5, 0.5));

        let buf = layer.draw_buf().unwrap();
        assert_eq!(buf.pixel(7, 7), Some(BLACK));
        assert_eq!(buf.pixel(8, 8), Some(RED));
        assert_eq!(buf.pixel(23, 23), Some(RED));
        assert_eq!(buf.pixel(24, 24), Some(BLACK));
    }

    #[test]
    fn half_opacity_image_composites_over_destination() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 63, 63));
        let mut dsc = rgb565_image(32, 32, RED);
        dsc.style.opa = Opa::HALF;
        h.add(&layer, Area::new(16, 16, 47, 47), DrawTaskKind::Image(dsc));
        h.drain(&layer);

        let rec = h.ppe.last_transfer().unwrap();
        assert_eq!(rec.layer_count(), 2);
        let dest = layer.addr_of(16, 16).unwrap();
        assert_eq!(rec.layer(InputLayer::Layer1).unwrap().source, PicSource::Dma(dest.clone()));
        let top = rec.layer(InputLayer::Layer2).unwrap();
        assert!(matches!(top.source, PicSource::Dma(_)));
        assert_eq!(top.alpha, Opa::HALF.0);
        assert_eq!(rec.result.dest, dest);

        // Half red over black, quantized through RGB565.
        let buf = layer.draw_buf().unwrap();
        assert_eq!(buf.pixel(20, 20), Some(Color32::new(132, 0, 0, 0xff)));
        assert_eq!(buf.pixel(15, 15), Some(BLACK));
    }

    #[test]
    fn opaque_image_uses_single_layer() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 63, 63));
        h.add(&layer, Area::new(0, 0, 31, 31), DrawTaskKind::Image(rgb565_image(32, 32, RED)));
        h.drain(&layer);

        assert_eq!(h.ppe.last_transfer().unwrap().layer_count(), 1);
        assert_eq!(layer.draw_buf().unwrap().pixel(31, 31), Some(RED));
        assert_eq!(h.unit.stats().images, 1);
    }

    #[test]
    fn rotated_image_is_processed_in_16px_blocks() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 63, 63));
        let mut dsc = rgb565_image(32, 32, RED);
        dsc.style.rotation = 900;
        h.add(&layer, Area::new(0, 0, 31, 31), DrawTaskKind::Image(dsc));
        h.drain(&layer);

        let rec = h.ppe.last_transfer().unwrap();
        assert_eq!(rec.layer(InputLayer::Layer1).unwrap().angle, 90);
        assert_eq!((rec.result.blk_width, rec.result.blk_height), (16, 16));
    }

    #[test]
    fn tiled_image_transfers_each_tile() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 63, 63));
        let mut dsc = rgb565_image(16, 16, RED);
        dsc.style.tile = true;
        h.add(&layer, Area::new(0, 0, 31, 47), DrawTaskKind::Image(dsc));
        h.drain(&layer);

        assert_eq!(h.ppe.transfer_count(), 6);
        assert_eq!(layer.draw_buf().unwrap().pixel(31, 47), Some(RED));
        assert_eq!(layer.draw_buf().unwrap().pixel(32, 47), Some(BLACK));
    }

    #[test]
    fn layer_without_buffer_is_skipped() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 63, 63));
        let child = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 31, 31));
        let dsc = LayerDsc { src: child, style: ImageStyle::default() };
        let t = h.add(&layer, Area::new(0, 0, 31, 31), DrawTaskKind::Layer(dsc));
        h.drain(&layer);

        assert_eq!(t.state(), TaskState::Ready);
        assert_eq!(h.ppe.transfer_count(), 0);
    }

    // ── line / mask ───────────────────────────────────────────────────────

    #[test]
    fn horizontal_line_fills_stroke_box() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let dsc = LineDsc::new(Point::new(10, 20), Point::new(80, 20), 4, Color::hex(0xff0000));
        let t = h.add(&layer, dsc.bounds(), DrawTaskKind::Line(dsc));
        assert_eq!(t.preference().unit, Some(PPE_UNIT_ID));
        h.drain(&layer);

        let rec = h.ppe.last_transfer().unwrap();
        assert_eq!((rec.result.pic_width, rec.result.pic_height), (75, 5));
        let buf = layer.draw_buf().unwrap();
        assert_eq!(buf.pixel(8, 18), Some(RED));
        assert_eq!(buf.pixel(82, 22), Some(RED));
        assert_eq!(buf.pixel(8, 23), Some(BLACK));
    }

    #[test]
    fn mask_rect_clears_four_bands() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let white = Color32::new(0xff, 0xff, 0xff, 0xff);
        let buf = DrawBuf::new(BufHeader::new(101, 101, ColorFormat::Argb8888));
        buf.clear(white);
        let layer = Layer::with_buffer(Area::new(0, 0, 100, 100), buf.clone());
        let dsc = MaskRectDsc { area: Area::new(20, 20, 80, 80), radius: 0 };
        h.add(&layer, layer.buf_area(), DrawTaskKind::MaskRect(dsc));
        h.drain(&layer);

        let history = h.ppe.history();
        let dims: Vec<_> = history.iter().map(|r| (r.result.pic_width, r.result.pic_height)).collect();
        assert_eq!(dims, vec![(101, 20), (101, 20), (20, 61), (20, 61)]);
        let covered: u32 = dims.iter().map(|(w, h)| w * h).sum();
        assert_eq!(covered, 101 * 101 - 61 * 61);
        for rec in &history {
            assert_eq!(rec.layer_count(), 1);
            assert_eq!(rec.layer(InputLayer::Layer1).unwrap().const_abgr8888, 0);
        }

        assert_eq!(buf.pixel(10, 10), Some(Color32::transparent()));
        assert_eq!(buf.pixel(90, 50), Some(Color32::transparent()));
        assert_eq!(buf.pixel(20, 20), Some(white));
        assert_eq!(buf.pixel(80, 80), Some(white));
        assert_eq!(h.unit.stats().masks, 1);
    }

    #[test]
    fn mask_outside_clip_is_noop() {
        let mut h = Harness::new(Completion::Immediate, PpeConfig::inline());
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 99, 99));
        let dsc = MaskRectDsc { area: Area::new(200, 200, 220, 220), radius: 0 };
        h.add(&layer, layer.buf_area(), DrawTaskKind::MaskRect(dsc));
        h.drain(&layer);
        assert_eq!(h.ppe.transfer_count(), 0);
    }
}

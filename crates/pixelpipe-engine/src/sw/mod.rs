//! CPU draw unit.
//!
//! Accepts every primitive at the initial preference score, so it only runs
//! what no accelerator claimed. It is also the fallback the accelerator path
//! uses for work too small to be worth a hardware round trip.

pub mod blend;
mod draw;

use std::sync::Arc;

use crate::draw::{
    DispatchCtx, DispatchOutcome, DrawTask, DrawUnit, Evaluation, INITIAL_PREFERENCE_SCORE, Layer,
    UnitId,
};

pub use draw::{draw_fill, draw_task};

pub const SW_UNIT_ID: UnitId = UnitId(1);

/// Inline software renderer.
#[derive(Debug, Default)]
pub struct SoftwareUnit {
    executed: u64,
}

impl SoftwareUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks executed so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }
}

impl DrawUnit for SoftwareUnit {
    fn id(&self) -> UnitId {
        SW_UNIT_ID
    }

    fn name(&self) -> &str {
        "SW"
    }

    fn evaluate(&self, task: &DrawTask) -> Evaluation {
        task.offer(SW_UNIT_ID, INITIAL_PREFERENCE_SCORE);
        Evaluation::Accepted { score: task.preference().score }
    }

    fn dispatch(&mut self, ctx: &DispatchCtx<'_>, layer: &Arc<Layer>) -> DispatchOutcome {
        let Some(task) = ctx.pool.next_unclaimed(layer, None, SW_UNIT_ID) else {
            return DispatchOutcome::Idle;
        };
        let Some(buf) = layer.ensure_buffer(ctx.allocator) else {
            return DispatchOutcome::Idle;
        };
        if !task.try_claim() {
            return DispatchOutcome::Idle;
        }

        draw_task(&task, &buf);
        task.finish();
        self.executed += 1;
        ctx.signal.request();
        DispatchOutcome::Claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Area;
    use crate::draw::shapes::{FillDsc, LineDsc, MaskRectDsc};
    use crate::draw::{HeapAllocator, Renderer, TaskState};
    use crate::coords::Point;
    use crate::paint::{Color, Color32, ColorFormat, Opa};
    use std::time::Duration;

    fn renderer() -> Renderer {
        let mut r = Renderer::new(Arc::new(HeapAllocator::unbounded()));
        r.register(Box::new(SoftwareUnit::new()));
        r
    }

    // ── evaluate ──────────────────────────────────────────────────────────

    #[test]
    fn accepts_everything_at_initial_score() {
        let r = renderer();
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 9, 9));
        let t = r.fill_solid(&layer, Area::new(0, 0, 4, 4), Color::white());
        assert_eq!(t.preference().unit, Some(SW_UNIT_ID));
        assert_eq!(t.preference().score, INITIAL_PREFERENCE_SCORE);
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn runs_fill_inline() {
        let mut r = renderer();
        let layer = Layer::new(ColorFormat::Argb8888, Area::new(0, 0, 9, 9));
        let t = r.add_fill(&layer, Area::new(2, 2, 5, 5), layer.buf_area(), FillDsc::solid(Color::hex(0x00ff00), Opa::COVER));
        r.run_until_idle(&layer, Duration::from_secs(1)).unwrap();

        assert_eq!(t.state(), TaskState::Ready);
        let buf = layer.draw_buf().unwrap();
        assert_eq!(buf.pixel(2, 2), Some(Color32::new(0, 0xff, 0, 0xff)));
        assert_eq!(buf.pixel(6, 6), Some(Color32::transparent()));
    }

    #[test]
    fn mask_clears_outside_only() {
        let mut r = renderer();
        let layer = Layer::new(ColorFormat::Argb8888, Area::new(0, 0, 9, 9));
        let white = Color::white();
        r.fill_solid(&layer, layer.buf_area(), white);
        r.add_mask_rect(&layer, layer.buf_area(), MaskRectDsc { area: Area::new(3, 3, 6, 6), radius: 0 });
        r.run_until_idle(&layer, Duration::from_secs(1)).unwrap();

        let buf = layer.draw_buf().unwrap();
        assert_eq!(buf.pixel(0, 0), Some(Color32::transparent()));
        assert_eq!(buf.pixel(9, 5), Some(Color32::transparent()));
        assert_eq!(buf.pixel(4, 4), Some(white.to_32(Opa::COVER)));
    }

    #[test]
    fn degenerate_line_is_noop() {
        let mut r = renderer();
        let layer = Layer::new(ColorFormat::Argb8888, Area::new(0, 0, 9, 9));
        let p = Point::new(4, 4);
        let t = r.add_line(&layer, layer.buf_area(), LineDsc::new(p, p, 3, Color::white()));
        r.run_until_idle(&layer, Duration::from_secs(1)).unwrap();
        assert_eq!(t.state(), TaskState::Ready);
        assert_eq!(layer.draw_buf().unwrap().pixel(4, 4), Some(Color32::transparent()));
    }

    #[test]
    fn allocation_failure_leaves_task_queued() {
        let mut r = Renderer::new(Arc::new(HeapAllocator::with_budget(0)));
        r.register(Box::new(SoftwareUnit::new()));
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 9, 9));
        let t = r.fill_solid(&layer, Area::new(0, 0, 4, 4), Color::white());
        assert!(!r.dispatch_layer(&layer));
        assert_eq!(t.state(), TaskState::Queued);
        assert!(r.run_until_idle(&layer, Duration::from_millis(20)).is_err());
    }
}

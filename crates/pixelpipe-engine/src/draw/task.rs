use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::coords::Area;
use crate::sync::lock;

use super::{DrawTaskKind, Layer, UnitId};

/// Score every task starts with before evaluators bid on it.
pub const INITIAL_PREFERENCE_SCORE: u32 = 100;

/// Monotonic task identifier, unique within a [`TaskPool`](super::TaskPool).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TaskId(pub u64);

/// Lifecycle of a task: queued → in-progress → ready.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum TaskState {
    Queued = 0,
    InProgress = 1,
    Ready = 2,
}

impl TaskState {
    #[inline]
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskState::Queued,
            1 => TaskState::InProgress,
            _ => TaskState::Ready,
        }
    }
}

/// Which unit should execute a task, and how strongly it wants to.
///
/// Lower scores win.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Preference {
    pub score: u32,
    pub unit: Option<UnitId>,
}

/// One unit of rendering work.
///
/// Geometry and descriptor are immutable; state and preference are updated
/// through interior mutability because the render loop, competing units and
/// worker threads all observe the same task.
#[derive(Debug)]
pub struct DrawTask {
    id: TaskId,
    kind: DrawTaskKind,
    area: Area,
    clip_area: Area,
    target: Arc<Layer>,
    state: AtomicU8,
    preference: Mutex<Preference>,
}

impl DrawTask {
    pub fn new(id: TaskId, kind: DrawTaskKind, area: Area, clip_area: Area, target: Arc<Layer>) -> Self {
        Self {
            id,
            kind,
            area,
            clip_area,
            target,
            state: AtomicU8::new(TaskState::Queued as u8),
            preference: Mutex::new(Preference {
                score: INITIAL_PREFERENCE_SCORE,
                unit: None,
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &DrawTaskKind {
        &self.kind
    }

    #[inline]
    pub fn area(&self) -> Area {
        self.area
    }

    #[inline]
    pub fn clip_area(&self) -> Area {
        self.clip_area
    }

    #[inline]
    pub fn target(&self) -> &Arc<Layer> {
        &self.target
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Atomically moves a queued task to in-progress.
    ///
    /// Exactly one caller wins when several units race for the same task.
    pub fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(
                TaskState::Queued as u8,
                TaskState::InProgress as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Marks the task as finished.
    pub fn finish(&self) {
        self.state.store(TaskState::Ready as u8, Ordering::Release);
    }

    pub fn preference(&self) -> Preference {
        *lock(&self.preference)
    }

    /// Bids `score` for `unit`.
    ///
    /// The bid wins if it beats the current score, or ties it while no unit owns
    /// the task yet. Returns `true` if `unit` is now preferred.
    pub fn offer(&self, unit: UnitId, score: u32) -> bool {
        let mut p = lock(&self.preference);
        if p.score > score || (p.unit.is_none() && p.score == score) {
            *p = Preference { score, unit: Some(unit) };
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Area;
    use crate::draw::shapes::MaskRectDsc;
    use crate::paint::ColorFormat;

    fn task() -> DrawTask {
        let layer = Layer::new(ColorFormat::Rgb565, Area::new(0, 0, 9, 9));
        let kind = DrawTaskKind::MaskRect(MaskRectDsc { area: Area::new(2, 2, 5, 5), radius: 0 });
        DrawTask::new(TaskId(1), kind, layer.buf_area(), layer.buf_area(), layer)
    }

    #[test]
    fn claim_succeeds_once() {
        let t = task();
        assert!(t.try_claim());
        assert!(!t.try_claim());
        assert_eq!(t.state(), TaskState::InProgress);
        t.finish();
        assert_eq!(t.state(), TaskState::Ready);
        assert!(!t.try_claim());
    }

    #[test]
    fn lower_score_wins_and_ties_only_take_unowned() {
        let t = task();
        assert!(t.offer(UnitId(1), INITIAL_PREFERENCE_SCORE));
        assert!(!t.offer(UnitId(2), INITIAL_PREFERENCE_SCORE));
        assert!(t.offer(UnitId(4), 70));
        assert!(!t.offer(UnitId(1), 100));
        assert_eq!(t.preference(), Preference { score: 70, unit: Some(UnitId(4)) });
    }
}

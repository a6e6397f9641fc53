use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::coords::Area;
use crate::sync::lock;

use super::{DrawTask, DrawTaskKind, Layer, TaskId, TaskState, UnitId};

/// Shared task pool for every layer, in submission order.
///
/// All units and the render loop see the same pool. Claiming a task is a
/// compare-and-swap on its state (see [`DrawTask::try_claim`]), so a task
/// handed out here may still be lost to a faster unit.
///
/// Ordering:
/// - tasks are only handed out when no earlier unfinished task on the same
///   layer overlaps them (painter's order is kept where it matters)
/// - otherwise whichever task the evaluators routed to the asking unit goes first
#[derive(Debug, Default)]
pub struct TaskPool {
    tasks: Mutex<Vec<Arc<DrawTask>>>,
    next_id: AtomicU64,
}

impl TaskPool {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and queues a task.
    pub fn push(&self, layer: &Arc<Layer>, kind: DrawTaskKind, area: Area, clip: Area) -> Arc<DrawTask> {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let task = Arc::new(DrawTask::new(id, kind, area, clip, Arc::clone(layer)));
        lock(&self.tasks).push(Arc::clone(&task));
        task
    }

    /// Next queued, independent task on `layer` routed to `preferred` (or to
    /// nobody), skipping tasks routed to `excluded`.
    pub fn next_unclaimed(
        &self,
        layer: &Layer,
        excluded: Option<UnitId>,
        preferred: UnitId,
    ) -> Option<Arc<DrawTask>> {
        let tasks = lock(&self.tasks);
        let on_layer: Vec<&Arc<DrawTask>> = tasks
            .iter()
            .filter(|t| t.target().id() == layer.id())
            .collect();

        for (i, t) in on_layer.iter().enumerate() {
            if t.state() != TaskState::Queued {
                continue;
            }
            let unit = t.preference().unit;
            if unit.is_some() && unit == excluded {
                continue;
            }
            if unit.is_some_and(|u| u != preferred) {
                continue;
            }
            let blocked = on_layer[..i]
                .iter()
                .any(|prev| prev.state() != TaskState::Ready && prev.area().overlaps(t.area()));
            if !blocked {
                return Some(Arc::clone(t));
            }
        }
        None
    }

    /// Drops finished tasks of `layer`. Returns how many were removed.
    pub fn remove_ready(&self, layer: &Layer) -> usize {
        let mut tasks = lock(&self.tasks);
        let before = tasks.len();
        tasks.retain(|t| !(t.target().id() == layer.id() && t.state() == TaskState::Ready));
        before - tasks.len()
    }

    /// Number of unfinished tasks targeting `layer`.
    pub fn pending(&self, layer: &Layer) -> usize {
        lock(&self.tasks)
            .iter()
            .filter(|t| t.target().id() == layer.id() && t.state() != TaskState::Ready)
            .count()
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every task. Used at shutdown.
    pub fn clear(&self) {
        lock(&self.tasks).clear();
    }
}

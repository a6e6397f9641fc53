use std::sync::Arc;

use anyhow::Result;

use super::{BufferAllocator, DispatchSignal, DrawTask, Layer, TaskPool};

/// Draw unit identifier, also used as the task routing key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct UnitId(pub u8);

/// Result of asking a unit whether it can execute a task.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Evaluation {
    /// The unit cannot draw this primitive. Not an error: another unit will.
    Rejected,
    /// The unit can draw it; `score` is the task's preference score afterwards.
    Accepted { score: u32 },
}

impl Evaluation {
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Evaluation::Accepted { .. })
    }
}

/// Result of one dispatch attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DispatchOutcome {
    /// Nothing for this unit right now (no routed task, or no buffer memory).
    Idle,
    /// A task was claimed and started.
    Claimed,
    /// The unit is still executing an earlier task.
    Busy,
}

/// Shared render-loop resources handed to units while dispatching.
pub struct DispatchCtx<'a> {
    pub pool: &'a TaskPool,
    pub allocator: &'a dyn BufferAllocator,
    pub signal: &'a DispatchSignal,
}

/// A backend competing for tasks in the shared pool.
///
/// The render loop iterates registered units without knowing their concrete type:
/// - `evaluate` runs once per submitted task, in registration order
/// - `dispatch` runs on every loop iteration for every layer with work
/// - `teardown` runs once at shutdown
pub trait DrawUnit: Send {
    fn id(&self) -> UnitId;

    fn name(&self) -> &str;

    /// Decides whether this unit can draw `task` and bids for it.
    fn evaluate(&self, task: &DrawTask) -> Evaluation;

    /// Claims and starts the next task routed to this unit, if any.
    fn dispatch(&mut self, ctx: &DispatchCtx<'_>, layer: &Arc<Layer>) -> DispatchOutcome;

    /// Stops the unit after its current task finishes. Queued work is abandoned.
    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}

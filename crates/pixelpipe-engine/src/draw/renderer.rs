use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

use crate::coords::Area;
use crate::display::DisplayDriver;

use super::{
    BufferAllocator, DispatchCtx, DispatchOutcome, DispatchSignal, DrawTask, DrawTaskKind,
    DrawUnit, Evaluation, Layer, TaskPool,
};

/// Render loop: owns the task pool and the registered draw units.
///
/// The loop never blocks on hardware. It dispatches, and when no unit could
/// start anything it sleeps on the [`DispatchSignal`] for at most one poll
/// interval before trying again.
pub struct Renderer {
    units: Vec<Box<dyn DrawUnit>>,
    pool: TaskPool,
    allocator: Arc<dyn BufferAllocator>,
    signal: Arc<DispatchSignal>,
    poll_interval: Duration,
}

impl Renderer {
    pub fn new(allocator: Arc<dyn BufferAllocator>) -> Self {
        Self {
            units: Vec::new(),
            pool: TaskPool::new(),
            allocator,
            signal: Arc::new(DispatchSignal::new()),
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Overrides how long the loop sleeps when nothing could be dispatched.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Re-dispatch signal to hand to asynchronous units.
    pub fn signal(&self) -> Arc<DispatchSignal> {
        Arc::clone(&self.signal)
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    pub fn allocator(&self) -> &Arc<dyn BufferAllocator> {
        &self.allocator
    }

    /// Adds a unit. Units evaluate tasks in registration order.
    pub fn register(&mut self, unit: Box<dyn DrawUnit>) {
        log::info!("draw unit registered: {} (id {})", unit.name(), unit.id().0);
        self.units.push(unit);
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Queues a task on `layer` and lets every unit bid for it.
    pub fn add_task(&self, layer: &Arc<Layer>, area: Area, clip: Area, kind: DrawTaskKind) -> Arc<DrawTask> {
        let task = self.pool.push(layer, kind, area, clip);

        for unit in &self.units {
            if let Evaluation::Accepted { score } = unit.evaluate(&task) {
                log::trace!("task {} ({}) accepted by {} at score {score}", task.id().0, task.kind().name(), unit.name());
            }
        }

        match task.preference().unit {
            Some(unit) => log::debug!("task {} ({}) routed to unit {}", task.id().0, task.kind().name(), unit.0),
            None => log::warn!("task {} ({}) was accepted by no unit", task.id().0, task.kind().name()),
        }

        task
    }

    /// Declares that no more tasks will be added to `layer` this frame.
    pub fn finish_layer(&self, layer: &Layer) {
        layer.set_all_tasks_added(true);
        self.signal.request();
    }

    /// Gives every unit one chance to start work on `layer`.
    ///
    /// Returns `true` if any unit claimed a task.
    pub fn dispatch_layer(&mut self, layer: &Arc<Layer>) -> bool {
        self.pool.remove_ready(layer);

        let ctx = DispatchCtx {
            pool: &self.pool,
            allocator: &*self.allocator,
            signal: &self.signal,
        };

        let mut claimed = false;
        for unit in self.units.iter_mut() {
            if unit.dispatch(&ctx, layer) == DispatchOutcome::Claimed {
                claimed = true;
            }
        }

        self.pool.remove_ready(layer);
        claimed
    }

    /// Dispatches until every task on `layer` is finished.
    ///
    /// Fails if work remains after `timeout` (stalled hardware, or a task no
    /// unit will take).
    pub fn run_until_idle(&mut self, layer: &Arc<Layer>, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let claimed = self.dispatch_layer(layer);

            let pending = self.pool.pending(layer);
            if pending == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("layer {} still has {pending} unfinished tasks after {timeout:?}", layer.id().0);
            }
            if !claimed {
                self.signal.wait_timeout(self.poll_interval);
            }
        }
    }

    /// Hands a fully drawn layer to the panel.
    ///
    /// Refuses while any task targeting the layer is unfinished, so the panel
    /// never scans out a buffer the accelerator is still writing.
    pub fn present(&self, layer: &Layer, display: &DisplayDriver) -> Result<()> {
        let pending = self.pool.pending(layer);
        if pending > 0 {
            bail!("cannot present layer {}: {pending} tasks still pending", layer.id().0);
        }
        let buf = layer
            .draw_buf()
            .with_context(|| format!("layer {} has no buffer to present", layer.id().0))?;
        display.publish_frame(buf)
    }

    /// Tears down every unit and drops queued work.
    pub fn shutdown(&mut self) -> Result<()> {
        for unit in self.units.iter_mut() {
            unit.teardown()
                .with_context(|| format!("failed to tear down draw unit {}", unit.name()))?;
        }
        self.units.clear();
        self.pool.clear();
        Ok(())
    }
}

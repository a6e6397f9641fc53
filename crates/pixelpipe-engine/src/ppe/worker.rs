use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::draw::{DispatchSignal, DrawTask, DrawTaskKind};
use crate::hal::CacheOps;
use crate::sw;
use crate::sync::lock;

use super::transfer::{TransferConfig, TransferEngine, TransferError};
use super::{PpeConfig, PpeStats, fill, image, line, mask};

/// Runs tasks on the accelerator. Shared by the worker thread and, in inline
/// mode, the render loop.
pub(crate) struct Executor {
    pub(super) engine: TransferEngine,
    pub(super) cache: Arc<dyn CacheOps>,
    pub(super) stats: Arc<PpeStats>,
    pub(super) config: PpeConfig,
}

impl Executor {
    pub(super) fn transfer(&self, config: &TransferConfig) -> Result<(), TransferError> {
        match self.engine.transfer(config) {
            Ok(()) => {
                self.stats.transfer();
                Ok(())
            }
            Err(e) => {
                self.stats.stall();
                Err(e)
            }
        }
    }

    /// Draws `task` into its target layer. The task is not marked ready here.
    pub(super) fn execute(&self, task: &DrawTask) {
        let layer = task.target();

        if let Some(area) = task.area().intersect(layer.buf_area()) {
            if let (Some(addr), Some(buf)) = (layer.addr_of(area.x1, area.y1), layer.draw_buf()) {
                let h = buf.header();
                let len = (area.height() as usize - 1) * h.stride as usize
                    + area.width() as usize * h.cf.bytes_per_pixel();
                self.cache.invalidate(&addr, len);
            }
        }

        let result = match task.kind() {
            DrawTaskKind::Fill(dsc) => fill::draw_fill(self, task, dsc),
            DrawTaskKind::Image(dsc) => {
                image::draw_image(self, task, &dsc.src, &dsc.style).map(|()| self.stats.image())
            }
            DrawTaskKind::Layer(dsc) => match dsc.src.draw_buf() {
                // Nothing was ever drawn on the source layer.
                None => Ok(()),
                Some(_) if dsc.style.bitmap_mask.is_some() => {
                    if let Some(buf) = layer.draw_buf() {
                        sw::draw_task(task, &buf);
                        self.stats.sw_fallback();
                    }
                    Ok(())
                }
                Some(src) => image::draw_image(self, task, &src, &dsc.style).map(|()| self.stats.layer()),
            },
            DrawTaskKind::Line(dsc) => line::draw_line(self, task, dsc),
            DrawTaskKind::MaskRect(dsc) => mask::draw_mask_rect(self, task, dsc),
            other => {
                log::warn!("ppe: no hardware path for {} task {}", other.name(), task.id().0);
                Ok(())
            }
        };

        if let Err(e) = result {
            log::error!("ppe: {} task {} abandoned: {e}", task.kind().name(), task.id().0);
        }
    }
}

#[derive(Default)]
struct Slot {
    task: Option<Arc<DrawTask>>,
    exit: bool,
}

/// The worker's single in-flight task slot and its wake-up signal.
#[derive(Default)]
pub(crate) struct WorkerContext {
    slot: Mutex<Slot>,
    wake: Condvar,
}

impl WorkerContext {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// `true` while a task is assigned and not yet finished.
    pub(super) fn is_busy(&self) -> bool {
        lock(&self.slot).task.is_some()
    }

    pub(super) fn assign(&self, task: Arc<DrawTask>) {
        lock(&self.slot).task = Some(task);
        self.wake.notify_one();
    }

    pub(super) fn request_exit(&self) {
        lock(&self.slot).exit = true;
        self.wake.notify_one();
    }

    /// Blocks until a task is assigned. Returns `None` once exit was requested.
    fn wait_for_task(&self) -> Option<Arc<DrawTask>> {
        let mut slot = lock(&self.slot);
        loop {
            if slot.exit {
                return None;
            }
            if let Some(task) = &slot.task {
                return Some(Arc::clone(task));
            }
            slot = self.wake.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn clear(&self) {
        lock(&self.slot).task = None;
    }
}

/// Marks `task` ready, frees the slot and asks the render loop to dispatch again.
pub(super) fn complete(ctx: &WorkerContext, task: &DrawTask, signal: &DispatchSignal) {
    task.finish();
    ctx.clear();
    signal.request();
}

pub(super) fn spawn(
    config: &PpeConfig,
    ctx: Arc<WorkerContext>,
    executor: Arc<Executor>,
    signal: Arc<DispatchSignal>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(config.thread_name.clone())
        .stack_size(config.stack_size)
        .spawn(move || {
            log::debug!("ppe worker started");
            while let Some(task) = ctx.wait_for_task() {
                executor.execute(&task);
                complete(&ctx, &task, &signal);
            }
            log::debug!("ppe worker exiting");
        })
}

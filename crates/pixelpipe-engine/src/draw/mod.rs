//! Draw-task model and render loop.
//!
//! Responsibilities:
//! - describe rendering work as typed tasks targeting layers
//! - share the task pool between the render loop and every draw unit
//! - route each task to the unit with the best preference score
//! - keep primitive-specific descriptors isolated per file under `draw::shapes`

mod buf;
mod cmd;
mod layer;
mod pool;
mod renderer;
mod signal;
mod task;
mod unit;

pub mod shapes;

pub use buf::{BufHeader, BufferAllocator, DmaAddr, DrawBuf, HeapAllocator};
pub use cmd::DrawTaskKind;
pub use layer::{Layer, LayerId};
pub use pool::TaskPool;
pub use renderer::Renderer;
pub use signal::DispatchSignal;
pub use task::{DrawTask, INITIAL_PREFERENCE_SCORE, Preference, TaskId, TaskState};
pub use unit::{DispatchCtx, DispatchOutcome, DrawUnit, Evaluation, UnitId};

//! Host simulation of the peripherals.
//!
//! The simulated accelerator really composites pixels into the destination
//! buffer and records every programmed transfer, so draw paths can be checked
//! both by register contents and by reading pixels back.

mod cache;
mod lcdc;
mod ppe;

pub use cache::{CacheCounters, SimCache};
pub use lcdc::SimLcdc;
pub use ppe::{Completion, SimPpe, TransferRecord};

//! Pixel-processing engine draw unit.
//!
//! Responsibilities:
//! - evaluate which primitives the accelerator can draw and bid for them
//! - claim routed tasks from the shared pool, one at a time
//! - execute them on a worker thread through the transfer engine
//! - fall back to software for work not worth a hardware round trip

mod config;
mod evaluate;
mod fill;
mod image;
mod line;
mod mask;
mod stats;
mod transfer;
mod unit;
mod worker;

pub use config::{ExecutionMode, PpeConfig};
pub use evaluate::{evaluate, image_supported, line_supported};
pub use stats::{PpeStats, PpeStatsSnapshot};
pub use transfer::{HardwareHeader, TransferConfig, TransferEngine, TransferError};
pub use unit::PpeUnit;

use crate::draw::UnitId;

pub const PPE_UNIT_ID: UnitId = UnitId(4);

/// Block granularity of the accelerator's transform path, in pixels.
pub const BLOCK_ALIGN: u32 = 16;

//! Hardware abstraction layer.
//!
//! The draw units and the display driver only talk to peripherals through the
//! traits in this module:
//! - [`PpeHardware`]: the 2D pixel-processing engine (layer compositor)
//! - [`LcdcHardware`]: the RGB-interface LCD controller
//! - [`CacheOps`]: data cache maintenance around DMA
//!
//! [`sim`] implements all three on the host.

pub mod cache;
pub mod lcdc;
pub mod ppe;
pub mod sim;

use std::sync::Arc;

pub use cache::CacheOps;
pub use lcdc::{LcdcHardware, LcdcIrq, PanelConfig, RgbTiming};
pub use ppe::{
    BackgroundSource, InputLayer, InputLayerConfig, Interp, LayerEnable, PicSource, PpeFormat,
    PpeHardware, PpeIrq, ResultLayerConfig,
};

pub use crate::draw::DmaAddr;

/// Interrupt service routine registered with a peripheral.
///
/// Handlers run in interrupt context: they must not block.
pub type IrqHandler = Arc<dyn Fn() + Send + Sync>;

//! Draw-unit dispatcher and PPE offload backend for an embedded GUI renderer.
//!
//! Rendering primitives are queued as [`draw::DrawTask`]s. Every registered
//! [`draw::DrawUnit`] bids on each task; the render loop ([`draw::Renderer`])
//! then lets the units claim and execute the tasks they won.
//!
//! - [`sw`]: software fallback unit
//! - [`ppe`]: pixel-processing-engine unit with its worker and transfer engine
//! - [`display`]: panel output with tear-free buffer swaps
//! - [`hal`]: peripheral traits plus a host simulation of them

pub mod coords;
pub mod display;
pub mod draw;
pub mod hal;
pub mod logging;
pub mod paint;
pub mod ppe;
pub mod sw;
pub mod sync;

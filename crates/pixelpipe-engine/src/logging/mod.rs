//! Logger setup for binaries and tests.
//!
//! The library only talks to the `log` facade. Hardware draw routines log
//! their elapsed time at `trace`, routing decisions at `debug`.

mod init;

pub use init::{LoggingConfig, init_logging};

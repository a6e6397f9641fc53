//! Blocking primitives shared by the draw units and drivers.
//!
//! These stand in for the RTOS semaphore and thread-sync objects of the target:
//! - [`BinarySemaphore`]: give/take permit, used as the transfer-slot gate
//! - [`lock`]: mutex access that survives a poisoned lock

mod semaphore;

pub use semaphore::BinarySemaphore;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `m`, recovering the guard if a previous holder panicked.
///
/// Every mutex in this crate protects plain data that is never left half-updated,
/// so continuing after a panic elsewhere is sound.
#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

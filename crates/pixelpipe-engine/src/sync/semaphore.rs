use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use super::lock;

/// Counting semaphore clamped to a single permit.
///
/// `give` on an already available semaphore is a no-op, so the permit count
/// never exceeds one. Not reentrant: a holder that takes twice deadlocks.
#[derive(Debug, Default)]
pub struct BinarySemaphore {
    available: Mutex<bool>,
    cond: Condvar,
}

impl BinarySemaphore {
    /// Creates a semaphore with the permit initially taken.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a semaphore with the permit initially available.
    pub fn available() -> Self {
        Self {
            available: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    /// Blocks until the permit is available, then takes it.
    pub fn take(&self) {
        let mut available = lock(&self.available);
        while !*available {
            available = self
                .cond
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available = false;
    }

    /// Like [`take`](Self::take) but gives up after `timeout`.
    ///
    /// Returns `true` if the permit was taken.
    pub fn take_timeout(&self, timeout: Duration) -> bool {
        let available = lock(&self.available);
        let (mut available, _) = self
            .cond
            .wait_timeout_while(available, timeout, |a| !*a)
            .unwrap_or_else(PoisonError::into_inner);
        if *available {
            *available = false;
            true
        } else {
            false
        }
    }

    /// Takes the permit only if it is available right now.
    pub fn try_take(&self) -> bool {
        let mut available = lock(&self.available);
        std::mem::replace(&mut *available, false)
    }

    /// Returns the permit and wakes one waiter.
    pub fn give(&self) {
        *lock(&self.available) = true;
        self.cond.notify_one();
    }
}

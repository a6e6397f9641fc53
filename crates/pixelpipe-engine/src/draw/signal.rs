use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::sync::lock;

/// Fire-and-forget "task pool changed" notification to the render loop.
///
/// Units raise it whenever a task finishes; the loop consumes it with
/// [`take`](Self::take) or sleeps on it with [`wait_timeout`](Self::wait_timeout).
#[derive(Debug, Default)]
pub struct DispatchSignal {
    requested: Mutex<bool>,
    cond: Condvar,
}

impl DispatchSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        *lock(&self.requested) = true;
        self.cond.notify_all();
    }

    /// Consumes a pending request. Returns `true` if one was pending.
    pub fn take(&self) -> bool {
        std::mem::replace(&mut *lock(&self.requested), false)
    }

    /// Waits up to `timeout` for a request and consumes it.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let requested = lock(&self.requested);
        let (mut requested, _) = self
            .cond
            .wait_timeout_while(requested, timeout, |r| !*r)
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *requested, false)
    }
}

use std::time::Duration;

/// Where hardware draw routines run.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ExecutionMode {
    /// A dedicated worker thread executes tasks; dispatch returns immediately.
    #[default]
    Threaded,
    /// Dispatch executes the task synchronously on the render loop.
    Inline,
}

/// Initialization parameters for the accelerator draw unit.
#[derive(Debug, Clone)]
pub struct PpeConfig {
    pub execution: ExecutionMode,

    /// Worker thread name.
    pub thread_name: String,

    /// Worker thread stack size in bytes.
    pub stack_size: usize,

    /// Fills smaller than `min_fill_size × min_fill_size` pixels are drawn in
    /// software. Also the minimum length of an accelerated line.
    pub min_fill_size: u32,

    /// Score the unit bids for every primitive it accepts. Lower wins.
    pub preference_ceiling: u32,

    /// Upper bound on waiting for the completion interrupt.
    ///
    /// `None` waits forever, matching the hardware's contract that every
    /// started transfer completes.
    pub completion_timeout: Option<Duration>,
}

impl Default for PpeConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionMode::Threaded,
            thread_name: "ppdraw".to_owned(),
            stack_size: 128 * 1024,
            min_fill_size: 50,
            preference_ceiling: 70,
            completion_timeout: None,
        }
    }
}

impl PpeConfig {
    /// Configuration that runs every task on the calling thread.
    pub fn inline() -> Self {
        Self { execution: ExecutionMode::Inline, ..Self::default() }
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }
}

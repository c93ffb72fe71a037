/// Receives batch progress as the engine moves through its waves.
pub trait Progress: Send + Sync {
    /// Label the current step, e.g. "Validating" or "Fetching".
    fn set_phase(&self, phase: &str);

    /// Begin tracking a batch of `total` requests.
    fn start(&self, total: u64);

    /// `completed` requests have reached a terminal state.
    fn update(&self, completed: u64);

    /// The batch is finished; clear any indicator.
    fn done(&self);
}

/// A [`Progress`] that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn set_phase(&self, _phase: &str) {}

    fn start(&self, _total: u64) {}

    fn update(&self, _completed: u64) {}

    fn done(&self) {}
}

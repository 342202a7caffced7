use std::time::Duration;

/// Monotonic hold-off window for control events.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    quiet_at: Duration,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_quiet(&self, now: Duration) -> bool {
        now >= self.quiet_at
    }

    /// Ignore events until `now + window`.
    pub fn suppress(&mut self, now: Duration, window: Duration) {
        self.quiet_at = now + window;
    }
}

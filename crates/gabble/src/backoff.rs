//! Pause between consecutive receive failures.
//!
//! A socket that keeps failing (for example after repeated ICMP errors)
//! would otherwise turn a receive loop into a busy spin.

use std::time::Duration;

const INITIAL_DELAY: Duration = Duration::from_millis(10);
const MAX_DELAY: Duration = Duration::from_secs(1);

/// Doubling delay, reset by the next successful receive.
#[derive(Debug, Default)]
pub(crate) struct RecvBackoff {
    failures: u32,
}

impl RecvBackoff {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one failure and returns how long to wait before retrying.
    pub(crate) fn failed(&mut self) -> Duration {
        let delay = INITIAL_DELAY
            .saturating_mul(1 << self.failures.min(7))
            .min(MAX_DELAY);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.failures = 0;
    }
}

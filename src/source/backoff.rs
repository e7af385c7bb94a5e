// SPDX-License-Identifier: GPL-3.0-or-later
use std::time::Duration;

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAXIMUM_DELAY: Duration = Duration::from_secs(10);

/// Exponential reconnection delay for the frame stream.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Backoff {
    initial: Duration,
    current: Duration,
    maximum: Duration,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self::with_limits(INITIAL_DELAY, MAXIMUM_DELAY)
    }

    pub(crate) fn with_limits(initial: Duration, maximum: Duration) -> Self {
        Self {
            initial,
            current: initial,
            maximum,
        }
    }

    /// Return the delay to wait now, and double the delay for the next failure.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.maximum);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.initial.min(self.maximum);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

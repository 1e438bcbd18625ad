//! Per-worker rate limiting.
//!
//! Each worker pauses for a fixed interval after every port it consumes, so
//! one worker probes at most one port per interval and the aggregate rate
//! grows with the worker count.

use std::time::Duration;

/// A fixed pause taken after each consumed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    interval: Duration,
}

impl RateLimiter {
    /// A zero interval disables throttling.
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Sleep for the interval, or return at once when disabled.
    pub async fn pause(&self) {
        if self.is_enabled() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

//! Simulated network latency.

use crate::config::MockServiceOptions;
use rand::Rng;
use std::time::Duration;

/// Upper bound used when delays are enabled without an explicit maximum.
pub const DEFAULT_MAX_RANDOM_DELAY_MS: u64 = 1500;

/// Suspends a dispatch for a uniformly random duration in `[0, max_delay_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySimulator {
    enabled: bool,
    max_delay_ms: u64,
}

impl DelaySimulator {
    pub fn new(enabled: bool, max_delay_ms: u64) -> Self {
        Self {
            enabled,
            max_delay_ms,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    pub fn from_options(options: &MockServiceOptions) -> Self {
        Self::new(
            options.add_random_delays,
            options
                .max_random_delay_ms
                .unwrap_or(DEFAULT_MAX_RANDOM_DELAY_MS),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    /// Draw the next delay.
    pub fn duration(&self) -> Duration {
        if !self.enabled || self.max_delay_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=self.max_delay_ms))
    }

    /// Suspend for the next delay and report how long it was.
    ///
    /// A zero delay never touches the timer, so the caller continues within
    /// the same poll.
    pub async fn wait(&self) -> Duration {
        let delay = self.duration();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

impl Default for DelaySimulator {
    fn default() -> Self {
        Self::disabled()
    }
}

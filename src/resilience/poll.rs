//! Bounded polling policy for pending signing requests.
//!
//! A request that never turns terminal must not hang the run: the loop stops
//! after `max_attempts` polls or once `max_wait` has elapsed, whichever comes
//! first.

use std::time::Duration;

use crate::config::schema::{PollStrategy, PollingConfig};
use crate::resilience::backoff::calculate_backoff;

/// Delay and bounds for the status poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Base delay between polls.
    pub interval: Duration,
    /// Delay growth strategy.
    pub strategy: PollStrategy,
    /// Delay ceiling for the exponential strategy.
    pub max_interval: Duration,
    /// Maximum number of polls.
    pub max_attempts: u32,
    /// Maximum total wait.
    pub max_wait: Duration,
}

impl PollPolicy {
    /// Fixed-interval policy.
    pub fn fixed(interval: Duration, max_attempts: u32, max_wait: Duration) -> Self {
        Self {
            interval,
            strategy: PollStrategy::Fixed,
            max_interval: interval,
            max_attempts,
            max_wait,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            strategy: config.strategy,
            max_interval: Duration::from_millis(config.max_interval_ms),
            max_attempts: config.max_attempts,
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }

    /// Delay to wait after the `attempt`-th poll came back pending.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.strategy {
            PollStrategy::Fixed => self.interval,
            PollStrategy::Exponential => calculate_backoff(
                attempt.max(1),
                self.interval.as_millis() as u64,
                self.max_interval.as_millis() as u64,
            ),
        }
    }

    /// `true` once either bound is reached.
    pub fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        attempts >= self.max_attempts || elapsed >= self.max_wait
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

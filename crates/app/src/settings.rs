//! Tunables shared by the device adapter, bulk dispatcher and poller.

use std::time::Duration;

/// Worker pool size used for bulk commands and poll cycles.
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Exponential backoff for transient protocol failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first try, per protocol.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// How a single device command is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSettings {
    /// Upper bound for one protocol exchange.
    pub attempt_timeout: Duration,
    /// Deadline applied when the request does not carry one.
    pub command_deadline: Option<Duration>,
    pub retry: RetryPolicy,
    /// Maximum number of devices worked on at once.
    pub pool_size: usize,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            command_deadline: None,
            retry: RetryPolicy::default(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

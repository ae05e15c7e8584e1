//! Reconnection policy.

use std::time::Duration;

/// How often and how fast a dropped status channel is reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnection attempts after the channel drops; `0` never reconnects.
    pub max_attempts: u32,

    /// Delay before the first attempt.
    pub initial_delay: Duration,

    /// Upper bound for the doubling delay.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl ReconnectPolicy {
    /// Never reconnect.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Delay before attempt number `attempt` (starting at 1), doubling each
    /// time up to [`ReconnectPolicy::max_delay`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);

        self.initial_delay
            .checked_mul(1_u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

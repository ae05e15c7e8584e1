//! Tracking Config

use std::time::Duration;

use clap::Args;

use crate::domain::tracking::ReconnectPolicy;

/// Status channel reconnection settings.
#[derive(Debug, Args)]
pub struct TrackingConfig {
    /// Reconnection attempts after the status channel fails (0 disables)
    #[arg(long, env = "SACOLA_RECONNECT_ATTEMPTS", default_value_t = 0u32, global = true)]
    pub reconnect_attempts: u32,

    /// Delay before the first reconnection, in milliseconds
    #[arg(long, env = "SACOLA_RECONNECT_DELAY_MS", default_value_t = 500u64, global = true)]
    pub reconnect_delay_ms: u64,

    /// Upper bound for the reconnection delay, in milliseconds
    #[arg(
        long,
        env = "SACOLA_RECONNECT_MAX_DELAY_MS",
        default_value_t = 8_000u64,
        global = true
    )]
    pub reconnect_max_delay_ms: u64,
}

impl TrackingConfig {
    /// Reconnection policy for status subscriptions.
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect_attempts,
            initial_delay: Duration::from_millis(self.reconnect_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
        }
    }
}

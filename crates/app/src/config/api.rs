//! Backend Config

use std::time::Duration;

use clap::Args;
use sacola::ids::UserId;

/// Backend endpoints.
#[derive(Debug, Args)]
pub struct ApiConfig {
    /// REST API base URL
    #[arg(
        long,
        env = "SACOLA_API_URL",
        default_value = "http://localhost:8000/api",
        global = true
    )]
    pub api_url: String,

    /// Order status WebSocket base URL; the order id is appended
    #[arg(
        long,
        env = "SACOLA_WS_URL",
        default_value = "ws://localhost:8000/ws/order",
        global = true
    )]
    pub ws_url: String,

    /// Postal code directory base URL
    #[arg(
        long,
        env = "SACOLA_POSTAL_URL",
        default_value = "https://viacep.com.br",
        global = true
    )]
    pub postal_url: String,

    /// Per-request HTTP timeout in seconds
    #[arg(
        long,
        env = "SACOLA_HTTP_TIMEOUT_SECONDS",
        default_value_t = 10u64,
        global = true
    )]
    pub http_timeout_seconds: u64,

    /// Signed-in user id
    #[arg(short, long = "user", env = "SACOLA_USER_ID", default_value_t = 1i64, global = true)]
    pub user_id: i64,
}

impl ApiConfig {
    /// HTTP request timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// Session user.
    #[must_use]
    pub fn user(&self) -> UserId {
        UserId::new(self.user_id)
    }
}

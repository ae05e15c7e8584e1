//! Storefront configuration module

use clap::Args;

use crate::config::{
    api::ApiConfig,
    checkout::CheckoutConfig,
    observability::LoggingConfig,
    tracking::TrackingConfig,
};

pub mod api;
pub mod checkout;
pub mod observability;
pub mod tracking;

/// Sacola client configuration, shared by every command.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Backend endpoints and session user.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Fees and payment rules.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Status channel reconnection.
    #[command(flatten)]
    pub tracking: TrackingConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

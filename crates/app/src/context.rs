//! App Context

use std::sync::Arc;

use sacola::{fees::DeliveryFeePolicy, ids::UserId};
use thiserror::Error;

use crate::{
    config::AppConfig,
    domain::{
        addresses::{AddressesApi, HttpAddressesApi, PostalDirectory, ViaCepDirectory},
        bag::{BagApi, CartStore, HttpBagApi},
        catalog::{CatalogApi, HttpCatalogApi},
        checkout::{CheckoutSession, Navigator},
        orders::{HttpOrdersApi, OrdersApi},
        payments::{HttpPaymentsApi, PaymentResolver, PaymentsApi},
        ratings::{HttpRatingsApi, RatingsApi},
        tracking::{OrderStatusSubscriber, ReconnectPolicy, StatusChannel, WsStatusChannel},
    },
    http::{ApiClient, ApiError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build backend client")]
    Backend(#[source] ApiError),

    #[error("failed to build postal directory client")]
    PostalDirectory(#[source] ApiError),
}

/// Backend services and session rules for one signed-in user.
#[derive(Clone)]
pub struct AppContext {
    pub user: UserId,
    pub fees: DeliveryFeePolicy,
    pub express_fee: i64,
    pub allow_tokenless_card: bool,
    pub reconnect: ReconnectPolicy,
    pub catalog: Arc<dyn CatalogApi>,
    pub bag: Arc<dyn BagApi>,
    pub payments: Arc<dyn PaymentsApi>,
    pub addresses: Arc<dyn AddressesApi>,
    pub postal: Arc<dyn PostalDirectory>,
    pub orders: Arc<dyn OrdersApi>,
    pub ratings: Arc<dyn RatingsApi>,
    pub channel: Arc<dyn StatusChannel>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let timeout = config.api.http_timeout();

        let backend =
            ApiClient::new(&config.api.api_url, timeout).map_err(AppInitError::Backend)?;
        let postal = ApiClient::new(&config.api.postal_url, timeout)
            .map_err(AppInitError::PostalDirectory)?;

        Ok(Self {
            user: config.api.user(),
            fees: config.checkout.fee_policy(),
            express_fee: config.checkout.express_fee,
            allow_tokenless_card: config.checkout.allow_tokenless_card,
            reconnect: config.tracking.reconnect_policy(),
            catalog: Arc::new(HttpCatalogApi::new(backend.clone())),
            bag: Arc::new(HttpBagApi::new(backend.clone())),
            payments: Arc::new(HttpPaymentsApi::new(backend.clone())),
            addresses: Arc::new(HttpAddressesApi::new(backend.clone())),
            postal: Arc::new(ViaCepDirectory::new(postal)),
            orders: Arc::new(HttpOrdersApi::new(backend.clone())),
            ratings: Arc::new(HttpRatingsApi::new(backend)),
            channel: Arc::new(WsStatusChannel::new(&config.api.ws_url)),
        })
    }

    /// Bag store for the session user.
    #[must_use]
    pub fn cart_store(&self) -> CartStore {
        CartStore::new(self.user, Arc::clone(&self.bag), self.fees.clone())
    }

    /// Payment resolver for one checkout.
    #[must_use]
    pub fn payment_resolver(&self) -> PaymentResolver {
        PaymentResolver::new(Arc::clone(&self.payments))
    }

    /// Checkout session reporting placed orders to `navigator`.
    #[must_use]
    pub fn checkout_session(&self, navigator: Arc<dyn Navigator>) -> CheckoutSession {
        CheckoutSession::new(
            self.user,
            Arc::clone(&self.addresses),
            Arc::clone(&self.orders),
            navigator,
            self.allow_tokenless_card,
        )
    }

    /// Order status subscriber using the configured reconnection policy.
    #[must_use]
    pub fn status_subscriber(&self) -> OrderStatusSubscriber {
        OrderStatusSubscriber::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.channel),
            self.reconnect,
        )
    }
}

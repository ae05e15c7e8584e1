//! Payments service.

use async_trait::async_trait;
use mockall::automock;
use sacola::{
    ids::UserId,
    payments::{PaymentMethod, StoredCard},
};

use crate::http::{ApiClient, ApiError};

#[derive(Debug, Clone)]
pub struct HttpPaymentsApi {
    client: ApiClient,
}

impl HttpPaymentsApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentsApi for HttpPaymentsApi {
    async fn fetch_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        self.client.get("payment_methods").await
    }

    async fn fetch_cards(&self, user: UserId) -> Result<Vec<StoredCard>, ApiError> {
        self.client.get(&format!("usuarios/{user}/cartoes")).await
    }
}

#[automock]
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// Retrieve the payment method catalog.
    async fn fetch_methods(&self) -> Result<Vec<PaymentMethod>, ApiError>;

    /// Retrieve the cards stored for a user.
    async fn fetch_cards(&self, user: UserId) -> Result<Vec<StoredCard>, ApiError>;
}

//! Addresses service.

use async_trait::async_trait;
use mockall::automock;
use sacola::{address::Address, ids::UserId};

use crate::http::{ApiClient, ApiError};

#[derive(Debug, Clone)]
pub struct HttpAddressesApi {
    client: ApiClient,
}

impl HttpAddressesApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AddressesApi for HttpAddressesApi {
    async fn fetch_address(&self, user: UserId) -> Result<Address, ApiError> {
        let address: Option<Address> = self.client.get(&format!("usuarios/{user}/endereco")).await?;

        address.ok_or(ApiError::NotFound)
    }

    async fn save_address(&self, user: UserId, address: &Address) -> Result<Address, ApiError> {
        self.client.post(&format!("endereco/{user}"), address).await
    }
}

#[automock]
#[async_trait]
pub trait AddressesApi: Send + Sync {
    /// Retrieve the user's saved delivery address.
    ///
    /// A user without a saved address yields [`ApiError::NotFound`].
    async fn fetch_address(&self, user: UserId) -> Result<Address, ApiError>;

    /// Save a delivery address for the user.
    async fn save_address(&self, user: UserId, address: &Address) -> Result<Address, ApiError>;
}

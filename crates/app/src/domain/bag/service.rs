//! Bag service.

use async_trait::async_trait;
use mockall::automock;
use sacola::{
    cart::CartLine,
    ids::{LineId, UserId},
};

use crate::{
    domain::bag::{
        errors::BagServiceError,
        records::{BagLineRecord, NewBagLine, QuantityUpdate},
    },
    http::ApiClient,
};

#[derive(Debug, Clone)]
pub struct HttpBagApi {
    client: ApiClient,
}

impl HttpBagApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BagApi for HttpBagApi {
    async fn fetch_bag(&self, user: UserId) -> Result<Vec<CartLine>, BagServiceError> {
        let records: Vec<BagLineRecord> = self.client.get(&format!("sacola/{user}")).await?;

        records.into_iter().map(CartLine::try_from).collect()
    }

    async fn add_line(&self, user: UserId, line: NewBagLine) -> Result<CartLine, BagServiceError> {
        let record: BagLineRecord = self.client.post(&format!("sacola/{user}"), &line).await?;

        CartLine::try_from(record)
    }

    async fn update_line(
        &self,
        user: UserId,
        line: LineId,
        quantity: u32,
    ) -> Result<CartLine, BagServiceError> {
        let record: BagLineRecord = self
            .client
            .put(&format!("sacola/{user}/{line}"), &QuantityUpdate { quantity })
            .await?;

        CartLine::try_from(record)
    }

    async fn delete_line(&self, user: UserId, line: LineId) -> Result<(), BagServiceError> {
        self.client.delete(&format!("sacola/{user}/{line}")).await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait BagApi: Send + Sync {
    /// Retrieve every line in the user's bag.
    async fn fetch_bag(&self, user: UserId) -> Result<Vec<CartLine>, BagServiceError>;

    /// Add an item to the user's bag, returning the stored line.
    async fn add_line(&self, user: UserId, line: NewBagLine) -> Result<CartLine, BagServiceError>;

    /// Set a line's quantity, returning the stored line.
    async fn update_line(
        &self,
        user: UserId,
        line: LineId,
        quantity: u32,
    ) -> Result<CartLine, BagServiceError>;

    /// Delete a line from the user's bag.
    async fn delete_line(&self, user: UserId, line: LineId) -> Result<(), BagServiceError>;
}

//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use sacola::{
    checkout::OrderRequest,
    ids::{OrderId, UserId},
};

use crate::{
    domain::orders::records::{OrderStatusRecord, OrderSummary, PlacedOrder},
    http::{ApiClient, ApiError},
};

#[derive(Debug, Clone)]
pub struct HttpOrdersApi {
    client: ApiClient,
}

impl HttpOrdersApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrdersApi for HttpOrdersApi {
    async fn create_order(&self, order: &OrderRequest) -> Result<PlacedOrder, ApiError> {
        self.client.post("pedidos", order).await
    }

    async fn fetch_status(&self, order: OrderId) -> Result<OrderStatusRecord, ApiError> {
        self.client.get(&format!("pedidos/{order}")).await
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<OrderSummary>, ApiError> {
        self.client.get(&format!("pedidos/?usuario_id={user}")).await
    }
}

#[automock]
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Create an order. Sent once; never retried.
    async fn create_order(&self, order: &OrderRequest) -> Result<PlacedOrder, ApiError>;

    /// Retrieve the current status of an order.
    async fn fetch_status(&self, order: OrderId) -> Result<OrderStatusRecord, ApiError>;

    /// Retrieve the user's order history.
    async fn list_orders(&self, user: UserId) -> Result<Vec<OrderSummary>, ApiError>;
}

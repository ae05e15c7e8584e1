//! Order Records

use rust_decimal::Decimal;
use sacola::{
    ids::OrderId,
    orders::{OrderStatus, StatusEvent},
};
use serde::Deserialize;

/// Order created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub status: Option<String>,
}

/// Current status of one order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderStatusRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "codigo_entrega")]
    pub delivery_code: Option<String>,
}

impl From<OrderStatusRecord> for StatusEvent {
    fn from(record: OrderStatusRecord) -> Self {
        Self {
            status: record.status,
            delivery_code: record.delivery_code,
        }
    }
}

/// Order history entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "criado_em", default)]
    pub created_at: Option<String>,
    #[serde(rename = "total_price", default)]
    pub total: Decimal,
}

impl OrderSummary {
    /// Recognised stage, if the status is one.
    pub fn stage(&self) -> Option<OrderStatus> {
        OrderStatus::from_wire(&self.status)
    }
}

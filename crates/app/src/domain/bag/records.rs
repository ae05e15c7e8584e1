//! Bag Records

use rust_decimal::Decimal;
use sacola::{
    cart::CartLine,
    ids::{ItemId, LineId, RestaurantId},
    money::minor_from_decimal,
};
use serde::{Deserialize, Serialize};

use crate::domain::bag::errors::BagServiceError;

/// Bag line as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct BagLineRecord {
    pub id: LineId,
    pub item_id: ItemId,
    #[serde(rename = "restaurante_id")]
    pub restaurant_id: RestaurantId,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "preco_unitario")]
    pub unit_price: Decimal,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
}

impl TryFrom<BagLineRecord> for CartLine {
    type Error = BagServiceError;

    fn try_from(record: BagLineRecord) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(record.quantity)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or(BagServiceError::InvalidQuantity(record.id, record.quantity))?;

        let unit_price = minor_from_decimal(record.unit_price)
            .ok_or(BagServiceError::InvalidPrice(record.id))?;

        Ok(Self {
            line_id: record.id,
            item_id: record.item_id,
            restaurant_id: record.restaurant_id,
            quantity,
            unit_price,
            name: record
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("Item {}", record.item_id)),
        })
    }
}

/// New bag line request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewBagLine {
    pub item_id: ItemId,
    #[serde(rename = "restaurante_id")]
    pub restaurant_id: RestaurantId,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

/// Quantity update request.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct QuantityUpdate {
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

//! Catalog Records

use rust_decimal::Decimal;
use sacola::{ids::ItemId, money::minor_from_decimal};
use serde::Deserialize;

/// One dish on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuItem {
    pub id: ItemId,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "preco", default)]
    pub price: Decimal,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "imagem_url", default)]
    pub image_url: Option<String>,
}

impl MenuItem {
    /// Price in centavos, `None` if it does not fit.
    pub fn unit_price(&self) -> Option<i64> {
        minor_from_decimal(self.price)
    }
}

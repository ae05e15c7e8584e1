//! Test Fixtures

use sacola::{
    address::Address,
    cart::CartLine,
    ids::{AddressId, CardId, ItemId, LineId, PaymentMethodId, RestaurantId},
    payments::{PaymentMethod, StoredCard},
};

use crate::http::ApiError;

pub(crate) fn cart_line(line: i64, item: i64, quantity: u32, unit_price: i64) -> CartLine {
    CartLine {
        line_id: LineId::new(line),
        item_id: ItemId::new(item),
        restaurant_id: RestaurantId::new(1),
        quantity,
        unit_price,
        name: format!("Item {item}"),
    }
}

/// A 500 from the backend, in whatever error type wraps [`ApiError`].
pub(crate) fn server_error<E: From<ApiError>>() -> E {
    E::from(ApiError::UnexpectedStatus {
        status: 500,
        body: "internal error".to_string(),
    })
}

fn method(id: i64, code: &str, name: &str, requires_change: bool) -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId::new(id),
        code: code.to_string(),
        name: name.to_string(),
        requires_change,
    }
}

pub(crate) fn catalog() -> Vec<PaymentMethod> {
    vec![
        method(1, "PIX", "Pix", false),
        method(2, "CARTAO", "Cartão", false),
        method(3, "DINHEIRO", "Dinheiro", true),
    ]
}

pub(crate) fn stored_card(id: i64, token: &str) -> StoredCard {
    StoredCard {
        id: CardId::new(id),
        token: token.to_string(),
        brand: "VISA".to_string(),
        masked_number: "**** 4242".to_string(),
        nickname: None,
    }
}

pub(crate) fn address() -> Address {
    Address {
        id: Some(AddressId::new(4)),
        recipient: "Ana Souza".to_string(),
        postal_code: "01001000".to_string(),
        street: "Praça da Sé".to_string(),
        number: "100".to_string(),
        complement: Some("apto 12".to_string()),
        district: "Sé".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
    }
}

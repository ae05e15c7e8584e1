//! Catalog service.

use async_trait::async_trait;
use mockall::automock;
use sacola::ids::{ItemId, RestaurantId};
use tracing::debug;

use crate::{
    domain::catalog::records::MenuItem,
    http::{ApiClient, ApiError},
};

#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: ApiClient,
}

impl HttpCatalogApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_items(&self, restaurant: RestaurantId) -> Result<Vec<MenuItem>, ApiError> {
        self.client.get(&format!("restaurants/items/{restaurant}")).await
    }
}

#[automock]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Retrieve a restaurant's menu.
    async fn list_items(&self, restaurant: RestaurantId) -> Result<Vec<MenuItem>, ApiError>;
}

/// Find `item` on `restaurant`'s menu.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the menu has no such item, or the
/// [`ApiError`] that failed the menu request.
pub async fn find_item(
    api: &dyn CatalogApi,
    restaurant: RestaurantId,
    item: ItemId,
) -> Result<MenuItem, ApiError> {
    let menu = api.list_items(restaurant).await?;

    debug!(%restaurant, items = menu.len(), "menu loaded");

    menu.into_iter()
        .find(|entry| entry.id == item)
        .ok_or(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    const RESTAURANT: RestaurantId = RestaurantId::new(1);

    fn dish(id: i64, name: &str) -> MenuItem {
        MenuItem {
            id: ItemId::new(id),
            name: name.to_string(),
            price: Decimal::new(25_00, 2),
            description: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn finds_item_on_restaurant_menu() -> TestResult {
        let mut api = MockCatalogApi::new();
        api.expect_list_items()
            .with(eq(RESTAURANT))
            .times(1)
            .returning(|_| Ok(vec![dish(10, "Pastel"), dish(11, "Caldo de cana")]));

        let item = find_item(&api, RESTAURANT, ItemId::new(11)).await?;

        assert_eq!(item.name, "Caldo de cana");
        assert_eq!(item.unit_price(), Some(25_00));

        Ok(())
    }

    #[tokio::test]
    async fn item_missing_from_menu_is_not_found() {
        let mut api = MockCatalogApi::new();
        api.expect_list_items()
            .returning(|_| Ok(vec![dish(10, "Pastel")]));

        let result = find_item(&api, RESTAURANT, ItemId::new(99)).await;

        assert!(
            matches!(result, Err(ApiError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}

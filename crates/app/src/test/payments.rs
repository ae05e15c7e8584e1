//! Payments API whose card fetch waits for a release.

use std::sync::Arc;

use async_trait::async_trait;
use sacola::{
    ids::UserId,
    payments::{PaymentMethod, StoredCard},
};
use tokio::sync::Notify;

use crate::{
    domain::payments::PaymentsApi,
    http::ApiError,
    test::fixtures::{catalog, stored_card},
};

/// Answers the catalog at once and holds the cards until released.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeldCards {
    release: Arc<Notify>,
}

impl HeldCards {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Handle that lets the card fetch finish.
    pub(crate) fn release(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl PaymentsApi for HeldCards {
    async fn fetch_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        Ok(catalog())
    }

    async fn fetch_cards(&self, _user: UserId) -> Result<Vec<StoredCard>, ApiError> {
        self.release.notified().await;

        Ok(vec![stored_card(7, "tok_7")])
    }
}

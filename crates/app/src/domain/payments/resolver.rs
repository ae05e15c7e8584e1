//! Payment method resolver.
//!
//! Loads the payment catalog and stored cards, and publishes one consistent
//! [`PaymentSnapshot`] after every change.

use std::sync::Arc;

use sacola::{
    ids::{CardId, UserId},
    payments::{PaymentError, PaymentMethod, PaymentSnapshot, PaymentState, StoredCard},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{domain::payments::service::PaymentsApi, http::ApiError};

/// Payment step for one checkout session.
pub struct PaymentResolver {
    api: Arc<dyn PaymentsApi>,
    state: PaymentState,
    snapshots: watch::Sender<PaymentSnapshot>,
}

impl std::fmt::Debug for PaymentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentResolver")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PaymentResolver {
    #[must_use]
    pub fn new(api: Arc<dyn PaymentsApi>) -> Self {
        let (snapshots, _) = watch::channel(PaymentSnapshot::default());

        Self {
            api,
            state: PaymentState::new(),
            snapshots,
        }
    }

    /// Subscribe to payment snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PaymentSnapshot> {
        self.snapshots.subscribe()
    }

    /// Current consistent view.
    pub fn snapshot(&self) -> PaymentSnapshot {
        self.state.snapshot()
    }

    /// Catalog methods.
    pub fn methods(&self) -> &[PaymentMethod] {
        self.state.methods()
    }

    /// Stored cards.
    pub fn cards(&self) -> &[StoredCard] {
        self.state.cards()
    }

    /// Fetch the payment catalog. A failure keeps the previous catalog.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] that failed the request.
    pub async fn load_methods(&mut self) -> Result<(), ApiError> {
        self.state.methods_loading();
        self.publish();

        let result = self.api.fetch_methods().await;

        self.finish_methods(result)
    }

    /// Fetch the user's stored cards. A failure keeps the previous cards.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] that failed the request.
    pub async fn load_cards(&mut self, user: UserId) -> Result<(), ApiError> {
        self.state.cards_loading();
        self.publish();

        let result = self.api.fetch_cards(user).await;

        self.finish_cards(result)
    }

    /// Fetch the catalog and the cards concurrently. Each result is applied
    /// and published as soon as it arrives, so a slow or failed card request
    /// leaves the catalog usable.
    pub async fn load_all(
        &mut self,
        user: UserId,
    ) -> (Result<(), ApiError>, Result<(), ApiError>) {
        self.state.methods_loading();
        self.state.cards_loading();
        self.publish();

        let api = Arc::clone(&self.api);
        let mut methods = api.fetch_methods();
        let mut cards = api.fetch_cards(user);

        tokio::select! {
            result = &mut methods => {
                let methods = self.finish_methods(result);

                (methods, self.finish_cards(cards.await))
            }
            result = &mut cards => {
                let cards = self.finish_cards(result);

                (self.finish_methods(methods.await), cards)
            }
        }
    }

    /// Make the method with `code` active.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::UnknownMethod`] if the catalog has no such
    /// code.
    pub fn select(&mut self, code: &str) -> Result<(), PaymentError> {
        self.state.select(code)?;
        self.publish();

        Ok(())
    }

    /// Choose a stored card.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] unless a card method is active and the
    /// card is stored.
    pub fn select_card(&mut self, card: CardId) -> Result<(), PaymentError> {
        self.state.select_card(card)?;
        self.publish();

        Ok(())
    }

    /// Set the change-for amount from typed digits.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] unless cash is active and the digits fit.
    pub fn set_change_amount(&mut self, raw: &str) -> Result<(), PaymentError> {
        self.state.set_change_amount(raw)?;
        self.publish();

        Ok(())
    }

    /// Forget the current choice.
    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
        self.publish();
    }

    fn finish_methods(&mut self, result: Result<Vec<PaymentMethod>, ApiError>) -> Result<(), ApiError> {
        let outcome = match result {
            Ok(methods) => {
                debug!(methods = methods.len(), "payment catalog loaded");
                self.state.apply_methods(Ok(methods));

                Ok(())
            }
            Err(error) => {
                warn!(%error, "failed to load payment catalog");
                self.state.apply_methods(Err(error.to_string()));

                Err(error)
            }
        };

        self.publish();

        outcome
    }

    fn finish_cards(&mut self, result: Result<Vec<StoredCard>, ApiError>) -> Result<(), ApiError> {
        let outcome = match result {
            Ok(cards) => {
                debug!(cards = cards.len(), "stored cards loaded");
                self.state.apply_cards(Ok(cards));

                Ok(())
            }
            Err(error) => {
                warn!(%error, "failed to load stored cards");
                self.state.apply_cards(Err(error.to_string()));

                Err(error)
            }
        };

        self.publish();

        outcome
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sacola::payments::{LoadState, PaymentSelection};
    use testresult::TestResult;
    use tokio::time::timeout;

    use super::*;
    use crate::{
        domain::payments::service::MockPaymentsApi,
        test::{
            fixtures::{catalog, server_error, stored_card},
            payments::HeldCards,
        },
    };

    const USER: UserId = UserId::new(4);
    const WAIT: Duration = Duration::from_secs(2);

    fn resolver(api: MockPaymentsApi) -> PaymentResolver {
        PaymentResolver::new(Arc::new(api))
    }

    #[tokio::test]
    async fn load_all_applies_both_results() -> TestResult {
        let mut api = MockPaymentsApi::new();
        api.expect_fetch_methods().times(1).returning(|| Ok(catalog()));
        api.expect_fetch_cards()
            .times(1)
            .returning(|_| Ok(vec![stored_card(7, "tok_7")]));

        let mut resolver = resolver(api);
        let (methods, cards) = resolver.load_all(USER).await;
        methods?;
        cards?;

        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.methods_state, LoadState::Ready);
        assert_eq!(snapshot.cards_state, LoadState::Ready);
        assert_eq!(resolver.methods().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn catalog_is_published_while_cards_are_loading() -> TestResult {
        let api = HeldCards::new();
        let release = api.release();
        let mut resolver = PaymentResolver::new(Arc::new(api));
        let mut snapshots = resolver.subscribe();

        let load = tokio::spawn(async move {
            let outcome = resolver.load_all(USER).await;
            (resolver, outcome)
        });

        let seen = timeout(
            WAIT,
            snapshots.wait_for(|snapshot| snapshot.methods_state == LoadState::Ready),
        )
        .await??
        .clone();
        assert_eq!(seen.cards_state, LoadState::Loading);

        release.notify_one();
        let (resolver, (methods, cards)) = timeout(WAIT, load).await??;
        methods?;
        cards?;

        assert_eq!(resolver.snapshot().cards_state, LoadState::Ready);
        assert_eq!(resolver.cards().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn card_failure_leaves_catalog_usable() -> TestResult {
        let mut api = MockPaymentsApi::new();
        api.expect_fetch_methods().returning(|| Ok(catalog()));
        api.expect_fetch_cards().returning(|_| Err(server_error()));

        let mut resolver = resolver(api);
        let (methods, cards) = resolver.load_all(USER).await;

        assert!(methods.is_ok(), "catalog should load");
        assert!(cards.is_err(), "cards should fail");
        assert!(matches!(resolver.snapshot().cards_state, LoadState::Failed(_)));

        resolver.select("PIX")?;
        assert_eq!(resolver.snapshot().selection(), Some(PaymentSelection::Pix));

        Ok(())
    }

    #[tokio::test]
    async fn selection_is_published_whole() -> TestResult {
        let mut api = MockPaymentsApi::new();
        api.expect_fetch_methods().returning(|| Ok(catalog()));
        api.expect_fetch_cards()
            .returning(|_| Ok(vec![stored_card(7, "tok_7"), stored_card(8, "tok_8")]));

        let mut resolver = resolver(api);
        let (methods, cards) = resolver.load_all(USER).await;
        methods?;
        cards?;
        let mut snapshots = resolver.subscribe();
        snapshots.mark_unchanged();

        resolver.select("CARTAO")?;

        assert!(snapshots.has_changed()?, "selection should publish");
        let published = snapshots.borrow_and_update().clone();
        assert_eq!(published.method.map(|m| m.code), Some("CARTAO".to_string()));
        assert_eq!(published.card.map(|c| c.id), Some(CardId::new(7)));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_selection_publishes_nothing() -> TestResult {
        let mut api = MockPaymentsApi::new();
        api.expect_fetch_methods().returning(|| Ok(catalog()));

        let mut resolver = resolver(api);
        resolver.load_methods().await?;
        let mut snapshots = resolver.subscribe();
        snapshots.mark_unchanged();

        let result = resolver.select("BOLETO");

        assert!(
            matches!(result, Err(PaymentError::UnknownMethod(_))),
            "expected UnknownMethod, got {result:?}"
        );
        assert!(!snapshots.has_changed()?, "nothing should be published");

        Ok(())
    }

    #[tokio::test]
    async fn cards_loaded_after_card_choice_pick_first() -> TestResult {
        let mut api = MockPaymentsApi::new();
        api.expect_fetch_methods().returning(|| Ok(catalog()));
        api.expect_fetch_cards()
            .returning(|_| Ok(vec![stored_card(7, "tok_7")]));

        let mut resolver = resolver(api);
        resolver.load_methods().await?;
        resolver.select("CARTAO")?;
        assert!(resolver.snapshot().card.is_none());

        resolver.load_cards(USER).await?;

        assert_eq!(resolver.snapshot().card.map(|c| c.id), Some(CardId::new(7)));

        Ok(())
    }
}

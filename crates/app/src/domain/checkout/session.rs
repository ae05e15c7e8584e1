//! Checkout session.
//!
//! Gathers the bag, the delivery address, the delivery choice and the
//! payment selection, validates them together and submits exactly one
//! order request.

use std::{borrow::Cow, sync::Arc};

use jiff::Timestamp;
use mockall::automock;
use sacola::{
    address::Address,
    checkout::{CheckoutDraft, CheckoutPhase, CheckoutRules, DraftError},
    delivery::DeliveryChoice,
    ids::{OrderId, UserId},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    domain::{
        addresses::AddressesApi,
        bag::CartStore,
        checkout::errors::CheckoutError,
        orders::OrdersApi,
        payments::PaymentResolver,
    },
    http::ApiError,
};

/// Receives the placed order, e.g. to open its tracking view.
#[automock]
pub trait Navigator: Send + Sync {
    /// An order was created.
    fn order_placed(&self, order: OrderId);
}

/// Progress of the saved address fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AddressLoad {
    /// Not fetched yet.
    #[default]
    Loading,

    /// The user's saved address.
    Found(Address),

    /// The user has no saved address.
    Missing,

    /// The fetch failed with this message.
    Failed(String),
}

/// Checkout state for one session.
pub struct CheckoutSession {
    user: UserId,
    addresses: Arc<dyn AddressesApi>,
    orders: Arc<dyn OrdersApi>,
    navigator: Arc<dyn Navigator>,
    allow_tokenless_card: bool,
    address: Address,
    saved: watch::Sender<AddressLoad>,
    delivery: DeliveryChoice,
    phase: watch::Sender<CheckoutPhase>,
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("user", &self.user)
            .field("address", &self.address)
            .field("delivery", &self.delivery)
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl CheckoutSession {
    #[must_use]
    pub fn new(
        user: UserId,
        addresses: Arc<dyn AddressesApi>,
        orders: Arc<dyn OrdersApi>,
        navigator: Arc<dyn Navigator>,
        allow_tokenless_card: bool,
    ) -> Self {
        let (phase, _) = watch::channel(CheckoutPhase::LoadingPrereqs);
        let (saved, _) = watch::channel(AddressLoad::Loading);

        Self {
            user,
            addresses,
            orders,
            navigator,
            allow_tokenless_card,
            address: Address::default(),
            saved,
            delivery: DeliveryChoice::Standard,
            phase,
        }
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<CheckoutPhase> {
        self.phase.subscribe()
    }

    /// Current phase.
    pub fn phase(&self) -> CheckoutPhase {
        *self.phase.borrow()
    }

    /// Subscribe to the saved address fetch.
    pub fn subscribe_saved_address(&self) -> watch::Receiver<AddressLoad> {
        self.saved.subscribe()
    }

    /// Delivery address form.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Editable delivery address form.
    ///
    /// Once the form differs from the saved address, the order is sent
    /// without the saved address id.
    pub fn address_mut(&mut self) -> &mut Address {
        &mut self.address
    }

    /// The user has no saved address.
    pub fn address_missing(&self) -> bool {
        matches!(*self.saved.borrow(), AddressLoad::Missing)
    }

    /// The saved address could not be fetched.
    pub fn address_error(&self) -> Option<String> {
        match &*self.saved.borrow() {
            AddressLoad::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Delivery choice.
    pub fn delivery(&self) -> &DeliveryChoice {
        &self.delivery
    }

    /// Change the delivery choice.
    pub fn set_delivery(&mut self, delivery: DeliveryChoice) {
        self.delivery = delivery;
    }

    /// Fetch the saved address and the payment options concurrently.
    ///
    /// The address is applied and published as soon as it arrives. Address
    /// problems never block the form: a missing address sets
    /// [`CheckoutSession::address_missing`], any other failure sets
    /// [`CheckoutSession::address_error`]. The session always ends ready
    /// for input.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Prerequisites`] when the payment catalog
    /// cannot be fetched.
    pub async fn load_prerequisites(
        &mut self,
        payments: &mut PaymentResolver,
    ) -> Result<(), CheckoutError> {
        self.phase.send_replace(CheckoutPhase::LoadingPrereqs);
        self.saved.send_replace(AddressLoad::Loading);

        let addresses = Arc::clone(&self.addresses);
        let mut address = addresses.fetch_address(self.user);
        let loads = payments.load_all(self.user);
        tokio::pin!(loads);

        let (methods, cards) = tokio::select! {
            result = &mut address => {
                self.apply_saved_address(result);

                loads.await
            }
            outcome = &mut loads => {
                self.apply_saved_address(address.await);

                outcome
            }
        };

        if let Err(error) = cards {
            warn!(user = %self.user, %error, "continuing without stored cards");
        }

        self.phase.send_replace(CheckoutPhase::ReadyForInput);

        methods.map_err(CheckoutError::Prerequisites)
    }

    /// Check every input at `now` without submitting.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] listing everything that blocks submission.
    pub fn validate(
        &self,
        cart: &CartStore,
        payments: &PaymentResolver,
        now: Timestamp,
    ) -> Result<(), DraftError> {
        let payment = payments.snapshot();

        CheckoutDraft {
            cart: cart.cart(),
            address: &self.address,
            payment: &payment,
            delivery: &self.delivery,
            note: "",
        }
        .validate(&self.rules(cart), now)
    }

    /// Submit the order once.
    ///
    /// On success the bag is reset locally, the session moves to
    /// [`CheckoutPhase::Submitted`] and the navigator is told about the new
    /// order. On failure the session is ready for input again.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotReady`] outside
    /// [`CheckoutPhase::ReadyForInput`], [`CheckoutError::Draft`] when
    /// validation fails and [`CheckoutError::Transport`] when the backend
    /// rejects the order.
    pub async fn submit(
        &mut self,
        cart: &mut CartStore,
        payments: &PaymentResolver,
        note: &str,
    ) -> Result<OrderId, CheckoutError> {
        let phase = self.phase();
        if phase != CheckoutPhase::ReadyForInput {
            return Err(CheckoutError::NotReady(phase));
        }

        let payment = payments.snapshot();
        let address = self.submitted_address();
        let request = CheckoutDraft {
            cart: cart.cart(),
            address: &address,
            payment: &payment,
            delivery: &self.delivery,
            note,
        }
        .order_request(&self.rules(cart), Timestamp::now())?;

        self.phase.send_replace(CheckoutPhase::Submitting);

        match self.orders.create_order(&request).await {
            Ok(placed) => {
                info!(user = %self.user, order = %placed.id, "order placed");
                cart.reset();
                self.phase.send_replace(CheckoutPhase::Submitted(placed.id));
                self.navigator.order_placed(placed.id);

                Ok(placed.id)
            }
            Err(error) => {
                warn!(user = %self.user, %error, "failed to place order");
                self.phase.send_replace(CheckoutPhase::ReadyForInput);

                Err(CheckoutError::Transport(error))
            }
        }
    }

    fn apply_saved_address(&mut self, result: Result<Address, ApiError>) {
        let saved = match result {
            Ok(address) => {
                self.address = address.clone();

                AddressLoad::Found(address)
            }
            Err(error) if error.is_not_found() => {
                info!(user = %self.user, "no saved address");

                AddressLoad::Missing
            }
            Err(error) => {
                warn!(user = %self.user, %error, "failed to load saved address");

                AddressLoad::Failed(error.to_string())
            }
        };

        self.saved.send_replace(saved);
    }

    /// The form as it goes out. An edited form no longer refers to the
    /// saved record.
    fn submitted_address(&self) -> Cow<'_, Address> {
        let unchanged = match &*self.saved.borrow() {
            AddressLoad::Found(saved) => *saved == self.address,
            _ => false,
        };

        if unchanged || self.address.id.is_none() {
            Cow::Borrowed(&self.address)
        } else {
            Cow::Owned(Address {
                id: None,
                ..self.address.clone()
            })
        }
    }

    fn rules(&self, cart: &CartStore) -> CheckoutRules {
        CheckoutRules {
            fees: cart.fees().clone(),
            allow_tokenless_card: self.allow_tokenless_card,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::predicate::eq;
    use rust_decimal::Decimal;
    use sacola::{checkout::CheckoutIssue, fees::DeliveryFeePolicy, ids::AddressId};
    use testresult::TestResult;
    use tokio::time::timeout;

    use super::*;
    use crate::{
        domain::{
            addresses::MockAddressesApi,
            bag::MockBagApi,
            orders::{MockOrdersApi, PlacedOrder},
            payments::MockPaymentsApi,
        },
        test::{
            fixtures::{address, cart_line, catalog, server_error},
            payments::HeldCards,
        },
    };

    const USER: UserId = UserId::new(4);
    const WAIT: Duration = Duration::from_secs(2);

    async fn loaded_cart() -> TestResult<CartStore> {
        let mut bag = MockBagApi::new();
        bag.expect_fetch_bag()
            .returning(|_| Ok(vec![cart_line(1, 10, 2, 25_00)]));
        bag.expect_delete_line().never();

        let mut store = CartStore::new(USER, Arc::new(bag), DeliveryFeePolicy::Flat(10_00));
        store.load().await?;

        Ok(store)
    }

    fn payments_api() -> MockPaymentsApi {
        let mut api = MockPaymentsApi::new();
        api.expect_fetch_methods().returning(|| Ok(catalog()));
        api.expect_fetch_cards().returning(|_| Ok(Vec::new()));
        api
    }

    fn saved_address() -> MockAddressesApi {
        let mut api = MockAddressesApi::new();
        api.expect_fetch_address()
            .with(eq(USER))
            .returning(|_| Ok(address()));
        api
    }

    fn session(
        addresses: MockAddressesApi,
        orders: MockOrdersApi,
        navigator: MockNavigator,
    ) -> CheckoutSession {
        CheckoutSession::new(
            USER,
            Arc::new(addresses),
            Arc::new(orders),
            Arc::new(navigator),
            false,
        )
    }

    #[tokio::test]
    async fn prerequisites_end_ready_with_saved_address() -> TestResult {
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));
        let mut session = session(saved_address(), MockOrdersApi::new(), MockNavigator::new());

        assert_eq!(session.phase(), CheckoutPhase::LoadingPrereqs);

        session.load_prerequisites(&mut payments).await?;

        assert_eq!(session.phase(), CheckoutPhase::ReadyForInput);
        assert!(session.address().is_complete());
        assert_eq!(payments.methods().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn saved_address_is_published_before_payments_finish() -> TestResult {
        let api = HeldCards::new();
        let release = api.release();
        let mut payments = PaymentResolver::new(Arc::new(api));
        let mut session = session(saved_address(), MockOrdersApi::new(), MockNavigator::new());
        let mut saved = session.subscribe_saved_address();
        let phases = session.subscribe();

        let load = tokio::spawn(async move {
            let outcome = session.load_prerequisites(&mut payments).await;
            (session, outcome)
        });

        let seen = timeout(
            WAIT,
            saved.wait_for(|saved| matches!(saved, AddressLoad::Found(_))),
        )
        .await??
        .clone();
        assert_eq!(seen, AddressLoad::Found(address()));
        assert_eq!(*phases.borrow(), CheckoutPhase::LoadingPrereqs);

        release.notify_one();
        let (session, outcome) = timeout(WAIT, load).await??;
        outcome?;

        assert_eq!(session.phase(), CheckoutPhase::ReadyForInput);

        Ok(())
    }

    #[tokio::test]
    async fn missing_address_is_flagged_not_failed() -> TestResult {
        let mut addresses = MockAddressesApi::new();
        addresses
            .expect_fetch_address()
            .returning(|_| Err(ApiError::NotFound));
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));
        let mut session = session(addresses, MockOrdersApi::new(), MockNavigator::new());

        session.load_prerequisites(&mut payments).await?;

        assert!(session.address_missing());
        assert!(session.address_error().is_none());
        assert_eq!(session.phase(), CheckoutPhase::ReadyForInput);

        Ok(())
    }

    #[tokio::test]
    async fn address_failure_keeps_form_editable() -> TestResult {
        let mut addresses = MockAddressesApi::new();
        addresses
            .expect_fetch_address()
            .returning(|_| Err(server_error()));
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));
        let mut session = session(addresses, MockOrdersApi::new(), MockNavigator::new());

        session.load_prerequisites(&mut payments).await?;

        assert!(!session.address_missing());
        assert!(session.address_error().is_some());
        session.address_mut().recipient = "Ana".to_string();
        assert_eq!(session.address().recipient, "Ana");

        Ok(())
    }

    #[tokio::test]
    async fn submit_sends_one_order_and_resets_cart() -> TestResult {
        let mut cart = loaded_cart().await?;
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));

        let mut orders = MockOrdersApi::new();
        orders
            .expect_create_order()
            .withf(|request| {
                request.payment_method == "PIX"
                    && request.items.len() == 1
                    && request.total == Decimal::new(60_00, 2)
                    && request.note == "sem cebola"
            })
            .times(1)
            .returning(|_| {
                Ok(PlacedOrder {
                    id: OrderId::new(42),
                    status: None,
                })
            });

        let mut navigator = MockNavigator::new();
        navigator
            .expect_order_placed()
            .with(eq(OrderId::new(42)))
            .times(1)
            .return_const(());

        let mut session = session(saved_address(), orders, navigator);
        session.load_prerequisites(&mut payments).await?;
        payments.select("PIX")?;

        let order = session.submit(&mut cart, &payments, "sem cebola").await?;

        assert_eq!(order, OrderId::new(42));
        assert_eq!(session.phase(), CheckoutPhase::Submitted(OrderId::new(42)));
        assert!(cart.lines().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn untouched_saved_address_keeps_its_id() -> TestResult {
        let mut cart = loaded_cart().await?;
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));

        let mut orders = MockOrdersApi::new();
        orders
            .expect_create_order()
            .withf(|request| {
                request.address_id == Some(AddressId::new(4))
                    && request.address.id == Some(AddressId::new(4))
            })
            .times(1)
            .returning(|_| {
                Ok(PlacedOrder {
                    id: OrderId::new(42),
                    status: None,
                })
            });

        let mut navigator = MockNavigator::new();
        navigator.expect_order_placed().return_const(());

        let mut session = session(saved_address(), orders, navigator);
        session.load_prerequisites(&mut payments).await?;
        payments.select("PIX")?;

        session.submit(&mut cart, &payments, "").await?;

        Ok(())
    }

    #[tokio::test]
    async fn edited_saved_address_is_sent_without_id() -> TestResult {
        let mut cart = loaded_cart().await?;
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));

        let mut orders = MockOrdersApi::new();
        orders
            .expect_create_order()
            .withf(|request| {
                request.address_id.is_none()
                    && request.address.id.is_none()
                    && request.address.number == "250"
            })
            .times(1)
            .returning(|_| {
                Ok(PlacedOrder {
                    id: OrderId::new(43),
                    status: None,
                })
            });

        let mut navigator = MockNavigator::new();
        navigator.expect_order_placed().return_const(());

        let mut session = session(saved_address(), orders, navigator);
        session.load_prerequisites(&mut payments).await?;
        payments.select("PIX")?;
        session.address_mut().number = "250".to_string();

        session.submit(&mut cart, &payments, "").await?;

        Ok(())
    }

    #[tokio::test]
    async fn failed_submission_returns_to_input() -> TestResult {
        let mut cart = loaded_cart().await?;
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));

        let mut orders = MockOrdersApi::new();
        orders
            .expect_create_order()
            .times(1)
            .returning(|_| Err(server_error()));

        let mut navigator = MockNavigator::new();
        navigator.expect_order_placed().never();

        let mut session = session(saved_address(), orders, navigator);
        session.load_prerequisites(&mut payments).await?;
        payments.select("PIX")?;

        let result = session.submit(&mut cart, &payments, "").await;

        assert!(
            matches!(result, Err(CheckoutError::Transport(_))),
            "expected Transport, got {result:?}"
        );
        assert_eq!(session.phase(), CheckoutPhase::ReadyForInput);
        assert_eq!(cart.lines().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn incomplete_address_blocks_submission() -> TestResult {
        let mut cart = loaded_cart().await?;
        let mut payments = PaymentResolver::new(Arc::new(payments_api()));

        let mut orders = MockOrdersApi::new();
        orders.expect_create_order().never();

        let mut session = session(saved_address(), orders, MockNavigator::new());
        session.load_prerequisites(&mut payments).await?;
        payments.select("PIX")?;
        session.address_mut().number = String::new();

        let result = session.submit(&mut cart, &payments, "").await;

        assert!(
            matches!(
                &result,
                Err(CheckoutError::Draft(DraftError::Invalid(issues)))
                    if issues.contains(&CheckoutIssue::MissingAddressField(
                        sacola::address::AddressField::Number
                    ))
            ),
            "expected missing number, got {result:?}"
        );
        assert_eq!(session.phase(), CheckoutPhase::ReadyForInput);

        Ok(())
    }

    #[tokio::test]
    async fn submit_before_prerequisites_is_rejected() -> TestResult {
        let mut cart = loaded_cart().await?;
        let payments = PaymentResolver::new(Arc::new(MockPaymentsApi::new()));
        let mut session = session(MockAddressesApi::new(), MockOrdersApi::new(), MockNavigator::new());

        let result = session.submit(&mut cart, &payments, "").await;

        assert!(
            matches!(result, Err(CheckoutError::NotReady(CheckoutPhase::LoadingPrereqs))),
            "expected NotReady, got {result:?}"
        );

        Ok(())
    }
}

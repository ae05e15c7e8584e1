//! Cart store.
//!
//! Owns the session's bag and keeps it in step with the backend. Adding an
//! item waits for the backend; quantity changes and removals are applied
//! locally first and confirmed afterwards. Any failed mutation reloads the
//! bag from the backend, and if that also fails the lines from before the
//! mutation are restored. A request dropped before the backend answers
//! marks the bag stale, and the next change reloads it first.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
    time::Instant,
};

use futures::future::join_all;
use sacola::{
    cart::{Cart, CartError, CartLine, CartTotalError, CartTotals},
    delivery::DeliveryChoice,
    feedback::{Feedback, FeedbackBoard},
    fees::DeliveryFeePolicy,
    ids::{ItemId, LineId, RestaurantId, UserId},
    money::Brl,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::bag::{
    errors::CartStoreError,
    records::NewBagLine,
    service::BagApi,
};

/// How a mutation ended once the backend answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The backend accepted the change.
    Confirmed,

    /// The backend rejected the change; the bag was reloaded.
    Resynchronized,

    /// The backend rejected the change and the reload failed; the previous
    /// lines were restored.
    Restored,
}

/// Published view of the bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    /// Current lines.
    pub cart: Cart,

    /// Totals for standard delivery, `None` if they overflow.
    pub totals: Option<CartTotals>,

    /// A load is in flight.
    pub loading: bool,

    /// Last sync failure, cleared by the next successful load.
    pub error: Option<String>,

    /// A cancelled request left lines the backend has not confirmed.
    pub stale: bool,
}

/// Session bag kept in sync with the backend.
pub struct CartStore {
    user: UserId,
    api: Arc<dyn BagApi>,
    fees: DeliveryFeePolicy,
    cart: Cart,
    loading: bool,
    stale: bool,
    error: Option<String>,
    feedback: FeedbackBoard<ItemId>,
    snapshots: watch::Sender<CartSnapshot>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("user", &self.user)
            .field("cart", &self.cart)
            .field("loading", &self.loading)
            .field("stale", &self.stale)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty store for `user`. Nothing is fetched until
    /// [`CartStore::load`].
    #[must_use]
    pub fn new(user: UserId, api: Arc<dyn BagApi>, fees: DeliveryFeePolicy) -> Self {
        let (snapshots, _) = watch::channel(CartSnapshot::default());

        Self {
            user,
            api,
            fees,
            cart: Cart::new(),
            loading: false,
            stale: false,
            error: None,
            feedback: FeedbackBoard::new(),
            snapshots,
        }
    }

    /// Subscribe to bag snapshots.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    /// Fetch the bag, replacing local lines.
    ///
    /// On failure the previous lines are kept and the error is recorded.
    /// Loads are never retried.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the bag cannot be fetched or holds
    /// lines from more than one restaurant.
    pub async fn load(&mut self) -> Result<(), CartStoreError> {
        let mut store = InFlight::begin(self);
        store.loading = true;
        store.publish();

        let result = store.fetch().await;
        store.settle();
        store.loading = false;

        match result {
            Ok(cart) => {
                debug!(user = %store.user, lines = cart.len(), "bag loaded");
                store.cart = cart;
                store.stale = false;
                store.error = None;
                store.publish();

                Ok(())
            }
            Err(error) => {
                warn!(user = %store.user, %error, "failed to load bag");
                store.error = Some(error.to_string());
                store.publish();

                Err(error)
            }
        }
    }

    /// Add `quantity` of an item, waiting for the backend before the line
    /// appears.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::InvalidQuantity`] for a quantity below one
    /// and [`CartStoreError::Cart`] when the item belongs to another
    /// restaurant. Nothing is sent in either case. A stale bag that cannot
    /// be reloaded fails with the load error.
    pub async fn add_item(
        &mut self,
        item: ItemId,
        restaurant: RestaurantId,
        quantity: i64,
    ) -> Result<SyncOutcome, CartStoreError> {
        let quantity = line_quantity(quantity)?;

        self.recover().await?;
        self.cart.ensure_restaurant(restaurant)?;

        let mut store = InFlight::begin(self);
        store.pending = Some(item);
        store.feedback.pending(item);
        store.publish();

        let previous = store.cart.clone();
        let request = NewBagLine {
            item_id: item,
            restaurant_id: restaurant,
            quantity,
        };

        let response = store.api.add_line(store.user, request).await;
        let added = match response {
            Ok(line) => store.cart.upsert(line).map_err(|error| error.to_string()),
            Err(error) => Err(error.to_string()),
        };

        let outcome = match added {
            Ok(()) => {
                info!(user = %store.user, %item, quantity, "item added to bag");
                store.feedback.succeeded(item, Instant::now());
                store.error = None;
                store.publish();

                SyncOutcome::Confirmed
            }
            Err(cause) => {
                store.feedback.failed(item, Instant::now());

                store.resync(previous, cause).await
            }
        };

        store.settle();

        Ok(outcome)
    }

    /// Change a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Cart`] if the line is not in the bag and
    /// [`CartStoreError::InvalidQuantity`] for a quantity a line cannot hold.
    /// A stale bag that cannot be reloaded fails with the load error.
    pub async fn update_quantity(
        &mut self,
        line: LineId,
        quantity: i64,
    ) -> Result<SyncOutcome, CartStoreError> {
        self.recover().await?;

        if self.cart.line(line).is_none() {
            return Err(CartError::UnknownLine(line).into());
        }

        if quantity <= 0 {
            return self.delete_line(line).await;
        }

        let wire_quantity = line_quantity(quantity)?;
        let previous = self.cart.clone();

        self.cart.set_quantity(line, quantity)?;

        let mut store = InFlight::begin(self);
        store.publish();

        let response = store.api.update_line(store.user, line, wire_quantity).await;
        let confirmed = match response {
            Ok(stored) => store.cart.upsert(stored).map_err(|error| error.to_string()),
            Err(error) => Err(error.to_string()),
        };

        let outcome = match confirmed {
            Ok(()) => {
                debug!(user = %store.user, %line, quantity, "line quantity confirmed");
                store.publish();

                SyncOutcome::Confirmed
            }
            Err(cause) => store.resync(previous, cause).await,
        };

        store.settle();

        Ok(outcome)
    }

    /// Remove a line.
    ///
    /// A backend answer that the line no longer exists counts as
    /// confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Cart`] if the line is not in the bag. A
    /// stale bag that cannot be reloaded fails with the load error.
    pub async fn delete_line(&mut self, line: LineId) -> Result<SyncOutcome, CartStoreError> {
        self.recover().await?;

        let previous = self.cart.clone();

        self.cart
            .remove(line)
            .ok_or(CartError::UnknownLine(line))?;

        let mut store = InFlight::begin(self);
        store.publish();

        let response = store.api.delete_line(store.user, line).await;
        let outcome = match response {
            Ok(()) => SyncOutcome::Confirmed,
            Err(error) if error.is_not_found() => {
                debug!(user = %store.user, %line, "line already gone");

                SyncOutcome::Confirmed
            }
            Err(error) => store.resync(previous, error.to_string()).await,
        };

        store.settle();

        Ok(outcome)
    }

    /// Delete every line on the backend.
    ///
    /// A stale bag is reloaded first; if that fails the lines known locally
    /// are deleted.
    pub async fn clear(&mut self) -> SyncOutcome {
        if let Err(error) = self.recover().await {
            debug!(user = %self.user, %error, "clearing the lines known locally");
        }

        let previous = self.cart.clone();
        let lines: Vec<LineId> = self.cart.lines().iter().map(|line| line.line_id).collect();

        self.cart.clear();

        let mut store = InFlight::begin(self);
        store.publish();

        let results = join_all(
            lines
                .iter()
                .map(|line| store.api.delete_line(store.user, *line)),
        )
        .await;

        let failure = results
            .into_iter()
            .filter_map(Result::err)
            .find(|error| !error.is_not_found());

        let outcome = match failure {
            None => {
                info!(user = %store.user, "bag cleared");

                SyncOutcome::Confirmed
            }
            Some(error) => store.resync(previous, error.to_string()).await,
        };

        store.settle();

        outcome
    }

    /// Forget local lines without contacting the backend, e.g. after an
    /// order consumed the bag.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.stale = false;
        self.error = None;
        self.publish();
    }

    /// Current lines.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a cancelled request left lines the backend has not
    /// confirmed. The next change reloads the bag first.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Last sync failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Delivery fee policy.
    pub fn fees(&self) -> &DeliveryFeePolicy {
        &self.fees
    }

    /// Sum of the lines.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if the amounts overflow.
    pub fn subtotal(&self) -> Result<Brl, CartTotalError> {
        self.cart.subtotal()
    }

    /// Delivery fee for the current lines.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if the amounts overflow.
    pub fn delivery_fee(&self) -> Result<Brl, CartTotalError> {
        self.cart.delivery_fee(&self.fees)
    }

    /// Every derived amount for `delivery`.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if the amounts overflow.
    pub fn totals(&self, delivery: &DeliveryChoice) -> Result<CartTotals, CartTotalError> {
        self.cart.totals(&self.fees, delivery)
    }

    /// Order total for `delivery`.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if the amounts overflow.
    pub fn total(&self, delivery: &DeliveryChoice) -> Result<Brl, CartTotalError> {
        Ok(self.totals(delivery)?.total)
    }

    /// Visible add-to-bag feedback for an item.
    pub fn feedback(&self, item: ItemId) -> Option<Feedback> {
        self.feedback.get(item, Instant::now())
    }

    async fn fetch(&self) -> Result<Cart, CartStoreError> {
        let lines = self.api.fetch_bag(self.user).await?;

        Ok(Cart::with_lines(lines)?)
    }

    async fn recover(&mut self) -> Result<(), CartStoreError> {
        if self.stale {
            info!(user = %self.user, "reloading bag after a cancelled request");
            self.load().await?;
        }

        Ok(())
    }

    async fn resync(&mut self, previous: Cart, cause: String) -> SyncOutcome {
        warn!(user = %self.user, error = %cause, "bag change rejected, reloading");

        match self.fetch().await {
            Ok(cart) => {
                self.cart = cart;
                self.error = None;
                self.publish();

                SyncOutcome::Resynchronized
            }
            Err(reload) => {
                warn!(user = %self.user, error = %reload, "reload failed, restoring previous bag");
                self.cart = previous;
                self.error = Some(cause);
                self.publish();

                SyncOutcome::Restored
            }
        }
    }

    fn publish(&mut self) {
        self.feedback.sweep(Instant::now());

        self.snapshots.send_replace(CartSnapshot {
            cart: self.cart.clone(),
            totals: self
                .cart
                .totals(&self.fees, &DeliveryChoice::Standard)
                .ok(),
            loading: self.loading,
            error: self.error.clone(),
            stale: self.stale,
        });
    }
}

/// A backend request borrowing the store. Dropped before
/// [`InFlight::settle`], it clears the loading flag and any pending feedback
/// and marks the bag stale.
struct InFlight<'a> {
    store: &'a mut CartStore,
    pending: Option<ItemId>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(store: &'a mut CartStore) -> Self {
        Self {
            store,
            pending: None,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Deref for InFlight<'_> {
    type Target = CartStore;

    fn deref(&self) -> &CartStore {
        &*self.store
    }
}

impl DerefMut for InFlight<'_> {
    fn deref_mut(&mut self) -> &mut CartStore {
        &mut *self.store
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        warn!(user = %self.store.user, "bag request cancelled, marking bag stale");

        self.store.loading = false;
        self.store.stale = true;

        if let Some(item) = self.pending {
            self.store.feedback.remove(item);
        }

        self.store.publish();
    }
}

fn line_quantity(quantity: i64) -> Result<u32, CartStoreError> {
    u32::try_from(quantity)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or(CartStoreError::InvalidQuantity(quantity))
}

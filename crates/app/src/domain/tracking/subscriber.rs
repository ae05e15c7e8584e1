//! Order status subscriptions.
//!
//! [`OrderStatusSubscriber::attach`] spawns one task per order. The task
//! fetches the status snapshot and opens the status channel at the same
//! time, merges both into an [`OrderTracking`] and publishes a
//! [`TrackingSnapshot`] after every change. Closing or dropping the
//! [`Subscription`] stops the task, so a late snapshot can never update a
//! subscription that is gone.

use std::{future::Future, pin::Pin, sync::Arc};

use sacola::{
    ids::OrderId,
    orders::{OrderStatus, OrderTracking, StatusEvent},
};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
};
use tracing::{Instrument as _, debug, info, info_span, warn};

use crate::{
    domain::{
        orders::{OrderStatusRecord, OrdersApi},
        tracking::{channel::StatusChannel, reconnect::ReconnectPolicy},
    },
    http::ApiError,
};

/// Status channel connection state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Errored(String),
}

/// Published view of one tracked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSnapshot {
    /// Tracked order.
    pub order: OrderId,

    /// Status channel state.
    pub connection: ConnectionState,

    /// Merged status.
    pub tracking: OrderTracking,

    /// Last channel or snapshot failure, kept after the state moves on.
    pub last_error: Option<String>,
}

impl TrackingSnapshot {
    fn new(order: OrderId) -> Self {
        Self {
            order,
            connection: ConnectionState::Disconnected,
            tracking: OrderTracking::new(),
            last_error: None,
        }
    }

    /// Displayed status.
    pub fn status(&self) -> Option<OrderStatus> {
        self.tracking.status()
    }

    /// Delivery code, once seen.
    pub fn delivery_code(&self) -> Option<&str> {
        self.tracking.delivery_code()
    }
}

/// Starts order tracking tasks.
#[derive(Clone)]
pub struct OrderStatusSubscriber {
    orders: Arc<dyn OrdersApi>,
    channel: Arc<dyn StatusChannel>,
    policy: ReconnectPolicy,
}

impl std::fmt::Debug for OrderStatusSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStatusSubscriber")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl OrderStatusSubscriber {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersApi>,
        channel: Arc<dyn StatusChannel>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            orders,
            channel,
            policy,
        }
    }

    /// Start tracking `order`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn attach(&self, order: OrderId) -> Subscription {
        let (updates, receiver) = watch::channel(TrackingSnapshot::new(order));
        let (shutdown_tx, shutdown) = oneshot::channel();

        let orders = Arc::clone(&self.orders);
        let snapshot: SnapshotFuture = Box::pin(async move { orders.fetch_status(order).await });

        let tracker = Tracker {
            current: TrackingSnapshot::new(order),
            updates,
            shutdown,
            snapshot: Some(snapshot),
        };

        let task = tokio::spawn(
            run(tracker, Arc::clone(&self.channel), self.policy)
                .instrument(info_span!("order_tracking", order = %order)),
        );

        Subscription {
            order,
            receiver,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Live tracking of one order.
///
/// Dropping the subscription aborts its task; [`Subscription::close`] also
/// sends a close frame on the open channel.
#[derive(Debug)]
pub struct Subscription {
    order: OrderId,
    receiver: watch::Receiver<TrackingSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Tracked order.
    pub fn order(&self) -> OrderId {
        self.order
    }

    /// Latest published view.
    pub fn snapshot(&self) -> TrackingSnapshot {
        self.receiver.borrow().clone()
    }

    /// Receiver for published views.
    pub fn updates(&self) -> watch::Receiver<TrackingSnapshot> {
        self.receiver.clone()
    }

    /// Wait for the next published view. `None` once tracking has ended.
    pub async fn changed(&mut self) -> Option<TrackingSnapshot> {
        self.receiver.changed().await.ok()?;

        Some(self.receiver.borrow_and_update().clone())
    }

    /// Stop tracking and wait for the task to send the close frame.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            if shutdown.send(()).is_err() {
                debug!(order = %self.order, "tracking already finished");
            }
        }

        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(order = %self.order, %error, "tracking task failed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Tracks at most one order at a time.
#[derive(Debug)]
pub struct OrderTracker {
    subscriber: OrderStatusSubscriber,
    current: Option<Subscription>,
}

impl OrderTracker {
    #[must_use]
    pub fn new(subscriber: OrderStatusSubscriber) -> Self {
        Self {
            subscriber,
            current: None,
        }
    }

    /// Switch tracking to `order`. The previous subscription is closed
    /// before the new one opens; tracking the same order again keeps the
    /// current subscription.
    pub async fn track(&mut self, order: OrderId) -> &mut Subscription {
        if let Some(previous) = self.current.take_if(|current| current.order() != order) {
            previous.close().await;
        }

        self.current.get_or_insert_with(|| self.subscriber.attach(order))
    }

    /// Current subscription, if any.
    pub fn current(&self) -> Option<&Subscription> {
        self.current.as_ref()
    }

    /// Stop tracking.
    pub async fn stop(&mut self) {
        if let Some(current) = self.current.take() {
            current.close().await;
        }
    }
}

type SnapshotFuture = Pin<Box<dyn Future<Output = Result<OrderStatusRecord, ApiError>> + Send>>;

enum Woken<T> {
    Shutdown,
    Ready(T),
}

/// State owned by the tracking task.
struct Tracker {
    current: TrackingSnapshot,
    updates: watch::Sender<TrackingSnapshot>,
    shutdown: oneshot::Receiver<()>,
    snapshot: Option<SnapshotFuture>,
}

impl Tracker {
    fn order(&self) -> OrderId {
        self.current.order
    }

    /// Drive `future` while still applying the snapshot when it arrives.
    async fn until<F: Future>(&mut self, future: F) -> Woken<F::Output> {
        tokio::pin!(future);

        loop {
            tokio::select! {
                _ = &mut self.shutdown => return Woken::Shutdown,
                result = next_snapshot(&mut self.snapshot) => {
                    self.snapshot = None;
                    self.apply_snapshot(result);
                }
                output = &mut future => return Woken::Ready(output),
            }
        }
    }

    /// Wait for an outstanding snapshot after the channel is done.
    async fn finish_snapshot(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            tokio::select! {
                _ = &mut self.shutdown => {}
                result = snapshot => self.apply_snapshot(result),
            }
        }
    }

    fn apply_snapshot(&mut self, result: Result<OrderStatusRecord, ApiError>) {
        match result {
            Ok(record) => self.apply(&StatusEvent::from(record), "snapshot"),
            Err(error) => {
                warn!(%error, "failed to fetch order status");
                self.current.last_error = Some(error.to_string());
                self.publish();
            }
        }
    }

    fn apply_message(&mut self, message: &str) {
        self.apply(&StatusEvent::parse(message), "channel");
    }

    fn apply(&mut self, event: &StatusEvent, source: &'static str) {
        let outcome = self.current.tracking.apply(event);

        if let Some(raw) = &outcome.unrecognised {
            debug!(source, status = %raw, "ignoring unrecognised status");
        }

        if let Some(stale) = outcome.stale {
            debug!(source, %stale, "ignoring stale status");
        }

        if outcome.changed() {
            info!(source, status = ?self.current.tracking.status(), "order status updated");
            self.publish();
        }
    }

    fn set_connection(&mut self, connection: ConnectionState) {
        if self.current.connection != connection {
            self.current.connection = connection;
            self.publish();
        }
    }

    fn fail(&mut self, error: String) {
        self.current.last_error = Some(error.clone());
        self.set_connection(ConnectionState::Errored(error));
    }

    fn is_finished(&self) -> bool {
        self.current.tracking.status().is_some_and(OrderStatus::is_terminal)
    }

    fn publish(&self) {
        self.updates.send_replace(self.current.clone());
    }
}

async fn next_snapshot(
    slot: &mut Option<SnapshotFuture>,
) -> Result<OrderStatusRecord, ApiError> {
    match slot {
        Some(snapshot) => snapshot.await,
        None => std::future::pending().await,
    }
}

async fn run(mut tracker: Tracker, channel: Arc<dyn StatusChannel>, policy: ReconnectPolicy) {
    let mut attempt = 0;

    loop {
        tracker.set_connection(ConnectionState::Connecting);

        let connected = match tracker.until(channel.connect(tracker.order())).await {
            Woken::Shutdown => return tracker.set_connection(ConnectionState::Disconnected),
            Woken::Ready(connected) => connected,
        };

        let failure = match connected {
            Ok(mut stream) => {
                attempt = 0;
                tracker.set_connection(ConnectionState::Connected);

                loop {
                    match tracker.until(stream.next_message()).await {
                        Woken::Shutdown => {
                            if let Err(error) = stream.close().await {
                                debug!(%error, "failed to close status channel");
                            }

                            return tracker.set_connection(ConnectionState::Disconnected);
                        }
                        Woken::Ready(Some(Ok(message))) => tracker.apply_message(&message),
                        Woken::Ready(Some(Err(error))) => break Some(error.to_string()),
                        Woken::Ready(None) => break None,
                    }
                }
            }
            Err(error) => Some(error.to_string()),
        };

        let Some(error) = failure else {
            info!("status channel closed by backend");
            break;
        };

        warn!(%error, "status channel failed");
        tracker.fail(error);

        if tracker.is_finished() || attempt >= policy.max_attempts {
            break;
        }

        attempt += 1;
        let delay = policy.delay_for(attempt);
        debug!(attempt, ?delay, "reconnecting status channel");
        tracker.set_connection(ConnectionState::Disconnected);

        if matches!(tracker.until(tokio::time::sleep(delay)).await, Woken::Shutdown) {
            return tracker.set_connection(ConnectionState::Disconnected);
        }
    }

    tracker.set_connection(ConnectionState::Disconnected);
    tracker.finish_snapshot().await;
}

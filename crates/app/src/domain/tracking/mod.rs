//! Order tracking
//!
//! Live status for one placed order: a snapshot fetch and a status channel
//! run side by side and are merged so the displayed status never moves
//! backwards.

pub mod channel;
pub mod reconnect;
pub mod subscriber;

pub use channel::{ChannelError, StatusChannel, StatusStream, WsStatusChannel};
pub use reconnect::ReconnectPolicy;
pub use subscriber::{ConnectionState, OrderStatusSubscriber, OrderTracker, Subscription, TrackingSnapshot};

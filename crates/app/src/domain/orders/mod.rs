//! Orders

pub mod records;
pub mod service;

pub use records::{OrderStatusRecord, OrderSummary, PlacedOrder};
pub use service::*;

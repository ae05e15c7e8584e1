//! Bag

pub mod errors;
pub mod records;
pub mod service;
pub mod store;

pub use errors::{BagServiceError, CartStoreError};
pub use service::*;
pub use store::{CartSnapshot, CartStore, SyncOutcome};

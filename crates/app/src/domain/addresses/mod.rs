//! Addresses

pub mod directory;
pub mod service;

pub use directory::{LookupOutcome, PostalDirectory, ViaCepDirectory, prefill_address};
pub use service::*;

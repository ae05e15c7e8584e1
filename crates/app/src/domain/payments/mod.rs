//! Payments

pub mod resolver;
pub mod service;

pub use resolver::PaymentResolver;
pub use service::*;

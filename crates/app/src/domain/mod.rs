//! Domain

pub mod addresses;
pub mod bag;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod ratings;
pub mod tracking;

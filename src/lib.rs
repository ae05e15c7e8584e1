//! Sacola
//!
//! Sacola is the storefront core of a food-delivery client: bag contents and
//! totals, payment selection, delivery address, checkout validation, the
//! order status merge and order ratings.

pub mod address;
pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod feedback;
pub mod fees;
pub mod ids;
pub mod money;
pub mod orders;
pub mod payments;
pub mod prelude;
pub mod rating;

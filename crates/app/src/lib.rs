//! Sacola client: backend services, session stores and order tracking
//! built on the `sacola` storefront core.

pub mod config;
pub mod context;
pub mod domain;
pub mod http;
pub mod observability;

#[cfg(test)]
mod test;

//! Catalog

pub mod records;
pub mod service;

pub use records::MenuItem;
pub use service::*;

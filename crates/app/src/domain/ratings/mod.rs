//! Ratings

pub mod service;

pub use service::*;

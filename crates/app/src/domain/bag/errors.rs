//! Bag errors.

use sacola::{cart::CartError, ids::LineId};
use thiserror::Error;

use crate::http::ApiError;

/// Errors from the bag service.
#[derive(Debug, Error)]
pub enum BagServiceError {
    /// Transport or status failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend returned a line with a quantity below one.
    #[error("bag line {0} has invalid quantity {1}")]
    InvalidQuantity(LineId, i64),

    /// The backend returned a price that does not fit in centavos.
    #[error("bag line {0} has an invalid price")]
    InvalidPrice(LineId),
}

impl BagServiceError {
    /// Check if the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(error) if error.is_not_found())
    }
}

/// Errors from the cart store.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// A requested quantity below one, or beyond what a line can hold.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// The change breaks a cart rule.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The bag could not be loaded.
    #[error("failed to load bag")]
    Service(#[source] BagServiceError),
}

impl From<BagServiceError> for CartStoreError {
    fn from(error: BagServiceError) -> Self {
        Self::Service(error)
    }
}

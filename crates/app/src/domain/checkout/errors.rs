//! Checkout errors.

use sacola::checkout::{CheckoutPhase, DraftError};
use thiserror::Error;

use crate::http::ApiError;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout cannot be submitted while {0:?}")]
    NotReady(CheckoutPhase),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("failed to load payment methods")]
    Prerequisites(#[source] ApiError),

    #[error("failed to place order")]
    Transport(#[source] ApiError),
}

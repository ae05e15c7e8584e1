//! Test support.

pub(crate) mod channel;
pub(crate) mod fixtures;
pub(crate) mod payments;

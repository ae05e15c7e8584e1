//! Typed Ids
//!
//! The backend keys every resource with a plain integer. [`TypedId`] tags
//! the integer with the resource it belongs to so a line id can never be
//! passed where an item id is expected.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Integer id tagged with the resource type `T`.
pub struct TypedId<T>(i64, PhantomData<T>);

impl<T> TypedId<T> {
    /// Wrap a raw backend id.
    pub const fn new(id: i64) -> Self {
        Self(id, PhantomData)
    }

    /// Return the raw backend id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<i64> for TypedId<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T> From<TypedId<T>> for i64 {
    fn from(value: TypedId<T>) -> Self {
        value.get()
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

/// Marker for bag line ids.
#[derive(Debug)]
pub enum Line {}

/// Marker for catalog item ids.
#[derive(Debug)]
pub enum CatalogItem {}

/// Marker for restaurant ids.
#[derive(Debug)]
pub enum Restaurant {}

/// Marker for order ids.
#[derive(Debug)]
pub enum Order {}

/// Marker for user ids.
#[derive(Debug)]
pub enum User {}

/// Marker for stored card ids.
#[derive(Debug)]
pub enum Card {}

/// Marker for saved address ids.
#[derive(Debug)]
pub enum SavedAddress {}

/// Marker for payment method catalog ids.
#[derive(Debug)]
pub enum Method {}

/// Bag line (container) id, distinct from the product it holds.
pub type LineId = TypedId<Line>;

/// Catalog item (product) id.
pub type ItemId = TypedId<CatalogItem>;

/// Restaurant id.
pub type RestaurantId = TypedId<Restaurant>;

/// Server-assigned order id.
pub type OrderId = TypedId<Order>;

/// User id.
pub type UserId = TypedId<User>;

/// Stored card id.
pub type CardId = TypedId<Card>;

/// Saved address id.
pub type AddressId = TypedId<SavedAddress>;

/// Payment method catalog id.
pub type PaymentMethodId = TypedId<Method>;

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn serialises_as_bare_integer() -> TestResult {
        let id = OrderId::new(77);

        assert_eq!(serde_json::to_string(&id)?, "77");
        assert_eq!(serde_json::from_str::<OrderId>("77")?, id);

        Ok(())
    }

    #[test]
    fn displays_raw_value() {
        assert_eq!(LineId::new(5).to_string(), "5");
    }
}

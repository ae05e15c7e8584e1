//! Cart
//!
//! The cart is an ordered list of bag lines belonging to one restaurant.
//! Totals are always derived from the lines; nothing about them is stored.

use rusty_money::MoneyError;
use thiserror::Error;

use crate::{
    delivery::DeliveryChoice,
    fees::DeliveryFeePolicy,
    ids::{ItemId, LineId, RestaurantId},
    money::{Brl, brl},
};

/// Errors related to cart construction or mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// A line from another restaurant was added to a non-empty cart
    /// (cart restaurant, offending restaurant).
    #[error("cart holds items from restaurant {0}, cannot add items from restaurant {1}")]
    RestaurantMismatch(RestaurantId, RestaurantId),

    /// A line quantity below one.
    #[error("line quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// No line with this id is in the cart.
    #[error("line {0} is not in the cart")]
    UnknownLine(LineId),
}

/// Errors that can occur while calculating cart totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartTotalError {
    /// A line total does not fit in an `i64` amount of centavos.
    #[error("line {0} total overflows")]
    Overflow(LineId),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One product-quantity entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Bag line id assigned by the backend.
    pub line_id: LineId,

    /// Product held by this line.
    pub item_id: ItemId,

    /// Restaurant selling the product.
    pub restaurant_id: RestaurantId,

    /// Quantity, at least 1.
    pub quantity: u32,

    /// Unit price in centavos.
    pub unit_price: i64,

    /// Product display name.
    pub name: String,
}

impl CartLine {
    /// Price of the whole line, `None` on overflow.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

/// What [`Cart::set_quantity`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has the new quantity.
    Updated {
        /// Quantity before the change.
        previous: u32,
    },

    /// The quantity dropped to zero or below, so the line was removed.
    Removed(CartLine),
}

/// Derived cart amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    /// Sum of `unit_price * quantity` over all lines.
    pub subtotal: Brl,

    /// Delivery fee from the fee policy.
    pub delivery_fee: Brl,

    /// Delivery surcharge (express delivery).
    pub surcharge: Brl,

    /// `subtotal + delivery_fee + surcharge`.
    pub total: Brl,
}

/// Cart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart from lines, checking every cart invariant.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity line and
    /// [`CartError::RestaurantMismatch`] when the lines span restaurants.
    pub fn with_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, CartError> {
        let mut cart = Self::new();

        lines.into_iter().try_for_each(|line| cart.upsert(line))?;

        Ok(cart)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find a line by id.
    pub fn line(&self, line_id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Restaurant shared by every line, `None` for an empty cart.
    pub fn restaurant(&self) -> Option<RestaurantId> {
        self.lines.first().map(|line| line.restaurant_id)
    }

    /// Check an item from `restaurant` may join this cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RestaurantMismatch`] if the cart already holds
    /// items from another restaurant.
    pub fn ensure_restaurant(&self, restaurant: RestaurantId) -> Result<(), CartError> {
        match self.restaurant() {
            Some(current) if current != restaurant => {
                Err(CartError::RestaurantMismatch(current, restaurant))
            }
            Some(_) | None => Ok(()),
        }
    }

    /// Insert a line, or replace the line with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::RestaurantMismatch`] when the line belongs to another
    /// restaurant. A replacement of the only line may change restaurant.
    pub fn upsert(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        let position = self
            .lines
            .iter()
            .position(|existing| existing.line_id == line.line_id);

        match position {
            Some(index) => {
                if self.lines.len() > 1 {
                    self.ensure_restaurant(line.restaurant_id)?;
                }
                if let Some(existing) = self.lines.get_mut(index) {
                    *existing = line;
                }
            }
            None => {
                self.ensure_restaurant(line.restaurant_id)?;
                self.lines.push(line);
            }
        }

        Ok(())
    }

    /// Set a line's quantity. A quantity of zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if the line is not in the cart.
    pub fn set_quantity(
        &mut self,
        line_id: LineId,
        quantity: i64,
    ) -> Result<QuantityChange, CartError> {
        if quantity <= 0 {
            return self
                .remove(line_id)
                .map(QuantityChange::Removed)
                .ok_or(CartError::UnknownLine(line_id));
        }

        let quantity = u32::try_from(quantity).map_err(|_overflow| CartError::InvalidQuantity(quantity))?;

        let line = self
            .lines
            .iter_mut()
            .find(|line| line.line_id == line_id)
            .ok_or(CartError::UnknownLine(line_id))?;

        let previous = line.quantity;
        line.quantity = quantity;

        Ok(QuantityChange::Updated { previous })
    }

    /// Remove a line, returning it.
    pub fn remove(&mut self, line_id: LineId) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| line.line_id == line_id)?;

        Some(self.lines.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Calculate the subtotal of the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if a line total overflows or the money
    /// arithmetic fails.
    pub fn subtotal(&self) -> Result<Brl, CartTotalError> {
        self.lines.iter().try_fold(brl(0), |acc, line| {
            let line_total = line
                .line_total()
                .ok_or(CartTotalError::Overflow(line.line_id))?;

            Ok(acc.add(brl(line_total))?)
        })
    }

    /// Calculate the delivery fee under `policy`.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if the subtotal cannot be calculated.
    pub fn delivery_fee(&self, policy: &DeliveryFeePolicy) -> Result<Brl, CartTotalError> {
        let subtotal = self.subtotal()?;

        Ok(brl(policy.fee_for(subtotal.to_minor_units(), self.is_empty())))
    }

    /// Calculate every derived amount for the given fee policy and delivery.
    ///
    /// # Errors
    ///
    /// Returns a [`CartTotalError`] if a line total overflows or the money
    /// arithmetic fails.
    pub fn totals(
        &self,
        policy: &DeliveryFeePolicy,
        delivery: &DeliveryChoice,
    ) -> Result<CartTotals, CartTotalError> {
        let subtotal = self.subtotal()?;
        let delivery_fee = brl(policy.fee_for(subtotal.to_minor_units(), self.is_empty()));
        let surcharge = if self.is_empty() {
            brl(0)
        } else {
            brl(delivery.surcharge())
        };

        let total = subtotal.add(delivery_fee)?.add(surcharge)?;

        Ok(CartTotals {
            subtotal,
            delivery_fee,
            surcharge,
            total,
        })
    }
}

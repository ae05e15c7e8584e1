//! Checkout
//!
//! Validation of the combined checkout inputs and assembly of the single
//! order-creation request.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::{
    address::{Address, AddressField},
    cart::{Cart, CartTotalError},
    delivery::{DeliveryChoice, DeliveryIssue},
    fees::DeliveryFeePolicy,
    ids::{AddressId, ItemId, OrderId, RestaurantId},
    money::decimal_from_minor,
    payments::{PaymentIssue, PaymentKind, PaymentMethod, PaymentSnapshot},
};

/// Checkout readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    /// Saved address and payment options are being fetched.
    #[default]
    LoadingPrereqs,

    /// Waiting for the user; also the state after a failed submission.
    ReadyForInput,

    /// Order request in flight.
    Submitting,

    /// Order created.
    Submitted(OrderId),
}

/// A single reason the checkout cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutIssue {
    /// Nothing in the bag.
    #[error("the bag is empty")]
    EmptyCart,

    /// A required address field is empty.
    #[error("{0} is required")]
    MissingAddressField(AddressField),

    /// The payment selection is incomplete.
    #[error(transparent)]
    Payment(PaymentIssue),

    /// The delivery choice is incomplete.
    #[error(transparent)]
    Delivery(DeliveryIssue),
}

/// Every reason the checkout cannot be submitted, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutIssues(SmallVec<[CheckoutIssue; 4]>);

impl CheckoutIssues {
    /// The issues.
    pub fn as_slice(&self) -> &[CheckoutIssue] {
        &self.0
    }

    /// Whether `issue` is among the issues.
    pub fn contains(&self, issue: &CheckoutIssue) -> bool {
        self.0.contains(issue)
    }

    /// Missing address fields, for inline field errors.
    pub fn address_fields(&self) -> impl Iterator<Item = AddressField> + '_ {
        self.0.iter().filter_map(|issue| match issue {
            CheckoutIssue::MissingAddressField(field) => Some(*field),
            _ => None,
        })
    }

    /// Check if there are no issues.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of issues.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Display for CheckoutIssues {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (index, issue) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            Display::fmt(issue, f)?;
        }

        Ok(())
    }
}

impl std::error::Error for CheckoutIssues {}

/// Errors from assembling an order request.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    /// Validation failed.
    #[error("checkout is incomplete: {0}")]
    Invalid(CheckoutIssues),

    /// Totals could not be calculated.
    #[error(transparent)]
    Totals(#[from] CartTotalError),
}

/// Checkout policy knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutRules {
    /// Delivery fee policy.
    pub fees: DeliveryFeePolicy,

    /// Accept card payments without a stored card token.
    pub allow_tokenless_card: bool,
}

/// Every checkout input at submission time.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutDraft<'a> {
    /// Bag contents.
    pub cart: &'a Cart,

    /// Delivery address.
    pub address: &'a Address,

    /// Payment selection.
    pub payment: &'a PaymentSnapshot,

    /// Delivery choice.
    pub delivery: &'a DeliveryChoice,

    /// Free-text note for the restaurant.
    pub note: &'a str,
}

impl CheckoutDraft<'_> {
    /// Collect every issue that blocks submission at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::Invalid`] with all issues found, or
    /// [`DraftError::Totals`] when the order total cannot be calculated.
    pub fn validate(&self, rules: &CheckoutRules, now: Timestamp) -> Result<(), DraftError> {
        let mut issues = CheckoutIssues::default();

        if self.cart.is_empty() {
            issues.0.push(CheckoutIssue::EmptyCart);
        }

        issues.0.extend(
            self.address
                .missing_fields()
                .into_iter()
                .map(CheckoutIssue::MissingAddressField),
        );

        let total = self.cart.totals(&rules.fees, self.delivery)?.total;

        if let Err(issue) = self
            .payment
            .validate(total.to_minor_units(), rules.allow_tokenless_card)
        {
            issues.0.push(CheckoutIssue::Payment(issue));
        }

        if let Err(issue) = self.delivery.validate(now) {
            issues.0.push(CheckoutIssue::Delivery(issue));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(DraftError::Invalid(issues))
        }
    }

    /// Validate and assemble the order request.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] when validation fails.
    pub fn order_request(&self, rules: &CheckoutRules, now: Timestamp) -> Result<OrderRequest, DraftError> {
        self.validate(rules, now)?;

        let restaurant_id = self
            .cart
            .restaurant()
            .ok_or_else(|| DraftError::Invalid(CheckoutIssues(smallvec![CheckoutIssue::EmptyCart])))?;

        let totals = self.cart.totals(&rules.fees, self.delivery)?;

        let method = self.payment.method.as_ref();
        let kind = method.map(PaymentMethod::kind);

        let card_token = match kind {
            Some(PaymentKind::Card) => self
                .payment
                .card
                .as_ref()
                .map(|card| card.token.clone())
                .filter(|token| !token.is_empty()),
            _ => None,
        };

        let change_for = match kind {
            Some(PaymentKind::Cash) => self.payment.change_for.map(decimal_from_minor),
            _ => None,
        };

        Ok(OrderRequest {
            restaurant_id,
            address_id: self.address.id,
            address: self.address.clone(),
            items: self
                .cart
                .lines()
                .iter()
                .map(|line| OrderItem {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
                .collect(),
            payment_method: method.map(|method| method.code.clone()).unwrap_or_default(),
            card_token,
            change_for,
            delivery_type: self.delivery.kind(),
            scheduled_for: self.delivery.scheduled_for(),
            note: self.note.trim().to_string(),
            total: decimal_from_minor(totals.total.to_minor_units()),
        })
    }
}

/// One requested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    /// Catalog item.
    pub item_id: ItemId,

    /// Quantity.
    pub quantity: u32,
}

/// Order-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Restaurant shared by every cart line.
    pub restaurant_id: RestaurantId,

    /// Saved address id, when the address came from the backend.
    pub address_id: Option<AddressId>,

    /// Address as entered.
    pub address: Address,

    /// Items as `(item_id, quantity)` pairs.
    pub items: Vec<OrderItem>,

    /// Payment method code.
    pub payment_method: String,

    /// Card token for card payments.
    pub card_token: Option<String>,

    /// Change-for amount (major units) for cash payments.
    pub change_for: Option<Decimal>,

    /// `STANDARD`, `EXPRESS` or `SCHEDULED`.
    pub delivery_type: &'static str,

    /// Requested time for scheduled delivery.
    pub scheduled_for: Option<Timestamp>,

    /// Free-text note.
    pub note: String,

    /// Order total (major units) as shown to the user.
    pub total: Decimal,
}

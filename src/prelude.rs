//! Sacola prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    address::{Address, AddressField, PartialAddress, PostalCode, PostalCodeError},
    cart::{Cart, CartError, CartLine, CartTotalError, CartTotals, QuantityChange},
    checkout::{
        CheckoutDraft, CheckoutIssue, CheckoutIssues, CheckoutPhase, CheckoutRules, DraftError,
        OrderItem, OrderRequest,
    },
    delivery::{DeliveryChoice, DeliveryIssue},
    feedback::{Feedback, FeedbackBoard},
    fees::{DeliveryFeePolicy, FeeTier},
    ids::{AddressId, CardId, ItemId, LineId, OrderId, PaymentMethodId, RestaurantId, TypedId, UserId},
    money::{Brl, format_brl, format_money},
    orders::{MergeOutcome, OrderStatus, OrderTracking, StatusEvent},
    payments::{
        LoadState, PaymentError, PaymentIssue, PaymentKind, PaymentMethod, PaymentSelection,
        PaymentSnapshot, PaymentState, StoredCard,
    },
    rating::{NewRating, Rating, RatingError, Score},
};

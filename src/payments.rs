//! Payments
//!
//! Selection state for the checkout payment step. [`PaymentState`] owns the
//! catalog, the stored cards and the current choice; every mutation leaves
//! it in a consistent state that [`PaymentState::snapshot`] can publish as a
//! whole.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{CardId, PaymentMethodId},
    money::{MoneyInputError, format_brl, parse_digits},
};

/// Kind of payment, derived from the catalog code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    /// Instant transfer, complete once chosen.
    Pix,

    /// Card payment, needs a stored card.
    Card,

    /// Cash on delivery, optionally with change.
    Cash,
}

/// A payment method from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Catalog id.
    pub id: PaymentMethodId,

    /// Method code, e.g. `PIX`, `CARTAO`, `DINHEIRO`.
    #[serde(rename = "codigo")]
    pub code: String,

    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,

    /// True only for cash-like methods that may need change.
    #[serde(rename = "requer_troco", default)]
    pub requires_change: bool,
}

impl PaymentMethod {
    /// Kind of payment this method represents.
    ///
    /// Unknown codes behave as cash when they require change and as an
    /// instant method otherwise.
    pub fn kind(&self) -> PaymentKind {
        match self.code.to_ascii_uppercase().as_str() {
            "PIX" => PaymentKind::Pix,
            "CARTAO" | "CARD" | "CREDITO" | "DEBITO" => PaymentKind::Card,
            "DINHEIRO" | "CASH" => PaymentKind::Cash,
            _ if self.requires_change => PaymentKind::Cash,
            _ => PaymentKind::Pix,
        }
    }
}

/// Summary of a card stored for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCard {
    /// Card id.
    pub id: CardId,

    /// Payment processor token referencing the card.
    #[serde(default)]
    pub token: String,

    /// Card brand, e.g. `VISA`.
    #[serde(rename = "bandeira", default)]
    pub brand: String,

    /// Masked number, e.g. `**** 4242`.
    #[serde(rename = "numero_mascarado", default)]
    pub masked_number: String,

    /// User-chosen nickname.
    #[serde(rename = "apelido", default)]
    pub nickname: Option<String>,
}

/// Tagged payment choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSelection {
    /// Pix.
    Pix,

    /// Card, with the chosen stored card if any.
    Card {
        /// Chosen card.
        card: Option<StoredCard>,
    },

    /// Cash, with the amount to bring change for if any (centavos).
    Cash {
        /// Change-for amount.
        change_for: Option<i64>,
    },
}

/// Reasons a payment selection is not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentIssue {
    /// No method chosen.
    #[error("select a payment method")]
    NoMethod,

    /// Card payment without a tokenised card.
    #[error("select a card")]
    MissingCard,

    /// Change-for amount below the order total (change, total).
    #[error("change for {} is less than the order total {}", format_brl(*.0), format_brl(*.1))]
    ChangeBelowTotal(i64, i64),
}

impl PaymentSelection {
    /// Check the selection can be submitted for an order `total` (centavos).
    ///
    /// A card without token passes only when `allow_tokenless_card` is set.
    ///
    /// # Errors
    ///
    /// Returns the [`PaymentIssue`] that keeps the selection incomplete.
    pub fn validate(&self, total: i64, allow_tokenless_card: bool) -> Result<(), PaymentIssue> {
        match self {
            Self::Pix => Ok(()),
            Self::Card { card } => {
                let has_token = card.as_ref().is_some_and(|card| !card.token.is_empty());

                if has_token || allow_tokenless_card {
                    Ok(())
                } else {
                    Err(PaymentIssue::MissingCard)
                }
            }
            Self::Cash {
                change_for: Some(change),
            } if *change < total => Err(PaymentIssue::ChangeBelowTotal(*change, total)),
            Self::Cash { .. } => Ok(()),
        }
    }
}

/// Errors from mutating the payment selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The catalog has no method with this code.
    #[error("unknown payment method {0}")]
    UnknownMethod(String),

    /// A card was chosen before any method.
    #[error("no payment method selected")]
    NoMethodSelected,

    /// A card was chosen while the method is not a card method.
    #[error("cards can only be chosen for card payments")]
    CardNotAllowed,

    /// No stored card with this id.
    #[error("unknown card {0}")]
    UnknownCard(CardId),

    /// A change amount was entered while the method is not cash.
    #[error("change can only be set for cash payments")]
    ChangeNotAllowed,

    /// The change amount could not be parsed.
    #[error(transparent)]
    ChangeAmount(#[from] MoneyInputError),
}

/// Loading state of one remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Not requested yet.
    #[default]
    Idle,

    /// Request in flight.
    Loading,

    /// Loaded successfully.
    Ready,

    /// Request failed with this message.
    Failed(String),
}

impl LoadState {
    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Consistent view of the payment step, published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentSnapshot {
    /// Active method.
    pub method: Option<PaymentMethod>,

    /// Chosen card, only while the method is a card method.
    pub card: Option<StoredCard>,

    /// Change-for amount in centavos, only while the method is cash.
    pub change_for: Option<i64>,

    /// Catalog loading state.
    pub methods_state: LoadState,

    /// Stored cards loading state.
    pub cards_state: LoadState,
}

impl PaymentSnapshot {
    /// Tagged selection, `None` until a method is chosen.
    pub fn selection(&self) -> Option<PaymentSelection> {
        let method = self.method.as_ref()?;

        Some(match method.kind() {
            PaymentKind::Pix => PaymentSelection::Pix,
            PaymentKind::Card => PaymentSelection::Card {
                card: self.card.clone(),
            },
            PaymentKind::Cash => PaymentSelection::Cash {
                change_for: self.change_for,
            },
        })
    }

    /// Check the snapshot describes a complete selection for `total`.
    ///
    /// # Errors
    ///
    /// Returns the [`PaymentIssue`] that keeps the selection incomplete.
    pub fn validate(&self, total: i64, allow_tokenless_card: bool) -> Result<(), PaymentIssue> {
        self.selection()
            .ok_or(PaymentIssue::NoMethod)?
            .validate(total, allow_tokenless_card)
    }
}

/// Payment step state.
#[derive(Debug, Clone, Default)]
pub struct PaymentState {
    methods: Vec<PaymentMethod>,
    cards: Vec<StoredCard>,
    methods_state: LoadState,
    cards_state: LoadState,
    method: Option<PaymentMethod>,
    card: Option<StoredCard>,
    change_for: Option<i64>,
}

impl PaymentState {
    /// Create an empty state with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog methods.
    pub fn methods(&self) -> &[PaymentMethod] {
        &self.methods
    }

    /// Stored cards.
    pub fn cards(&self) -> &[StoredCard] {
        &self.cards
    }

    /// Mark the catalog request as in flight.
    pub fn methods_loading(&mut self) {
        self.methods_state = LoadState::Loading;
    }

    /// Mark the cards request as in flight.
    pub fn cards_loading(&mut self) {
        self.cards_state = LoadState::Loading;
    }

    /// Apply a catalog response. A failure keeps the previous catalog.
    pub fn apply_methods(&mut self, result: Result<Vec<PaymentMethod>, String>) {
        match result {
            Ok(methods) => {
                let still_offered = self
                    .method
                    .as_ref()
                    .is_none_or(|active| methods.iter().any(|method| method.code == active.code));

                if !still_offered {
                    self.clear_selection();
                }
                self.methods = methods;
                self.methods_state = LoadState::Ready;
            }
            Err(message) => self.methods_state = LoadState::Failed(message),
        }
    }

    /// Apply a stored cards response. A failure keeps the previous cards.
    pub fn apply_cards(&mut self, result: Result<Vec<StoredCard>, String>) {
        match result {
            Ok(cards) => {
                let still_stored = self
                    .card
                    .as_ref()
                    .is_none_or(|chosen| cards.iter().any(|card| card.id == chosen.id));

                if !still_stored {
                    self.card = None;
                }
                self.cards = cards;
                self.cards_state = LoadState::Ready;
                self.default_card();
            }
            Err(message) => self.cards_state = LoadState::Failed(message),
        }
    }

    /// Make the method with `code` active.
    ///
    /// Leaving a card method clears the card, leaving cash clears the change
    /// amount. Entering a card method with cards loaded and none chosen picks
    /// the first card.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::UnknownMethod`] if the catalog has no such code.
    pub fn select(&mut self, code: &str) -> Result<(), PaymentError> {
        let method = self
            .methods
            .iter()
            .find(|method| method.code.eq_ignore_ascii_case(code))
            .cloned()
            .ok_or_else(|| PaymentError::UnknownMethod(code.to_string()))?;

        let kind = method.kind();

        if kind != PaymentKind::Card {
            self.card = None;
        }
        if kind != PaymentKind::Cash {
            self.change_for = None;
        }

        self.method = Some(method);
        self.default_card();

        Ok(())
    }

    /// Choose a stored card for the active card method.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NoMethodSelected`] before a method is chosen,
    /// [`PaymentError::CardNotAllowed`] for non-card methods and
    /// [`PaymentError::UnknownCard`] for an unknown id.
    pub fn select_card(&mut self, card_id: CardId) -> Result<(), PaymentError> {
        let method = self.method.as_ref().ok_or(PaymentError::NoMethodSelected)?;

        if method.kind() != PaymentKind::Card {
            return Err(PaymentError::CardNotAllowed);
        }

        let card = self
            .cards
            .iter()
            .find(|card| card.id == card_id)
            .cloned()
            .ok_or(PaymentError::UnknownCard(card_id))?;

        self.card = Some(card);

        Ok(())
    }

    /// Set the change-for amount from raw typed digits (centavos).
    ///
    /// Non-digit characters are dropped; an input without digits unsets the
    /// amount.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::ChangeNotAllowed`] unless the active method is
    /// cash, or [`PaymentError::ChangeAmount`] when the digits overflow. The
    /// previous amount is kept on error.
    pub fn set_change_amount(&mut self, raw: &str) -> Result<(), PaymentError> {
        let is_cash = self
            .method
            .as_ref()
            .is_some_and(|method| method.kind() == PaymentKind::Cash);

        if !is_cash {
            return Err(PaymentError::ChangeNotAllowed);
        }

        self.change_for = parse_digits(raw)?;

        Ok(())
    }

    /// Forget the current choice.
    pub fn clear_selection(&mut self) {
        self.method = None;
        self.card = None;
        self.change_for = None;
    }

    /// Current consistent view.
    pub fn snapshot(&self) -> PaymentSnapshot {
        PaymentSnapshot {
            method: self.method.clone(),
            card: self.card.clone(),
            change_for: self.change_for,
            methods_state: self.methods_state.clone(),
            cards_state: self.cards_state.clone(),
        }
    }

    fn default_card(&mut self) {
        let is_card = self
            .method
            .as_ref()
            .is_some_and(|method| method.kind() == PaymentKind::Card);

        if is_card && self.card.is_none() {
            self.card = self.cards.first().cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn method(id: i64, code: &str, requires_change: bool) -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::new(id),
            code: code.to_string(),
            name: code.to_string(),
            requires_change,
        }
    }

    fn card(id: i64, token: &str) -> StoredCard {
        StoredCard {
            id: CardId::new(id),
            token: token.to_string(),
            brand: "VISA".to_string(),
            masked_number: "**** 4242".to_string(),
            nickname: None,
        }
    }

    fn catalog() -> Vec<PaymentMethod> {
        vec![
            method(1, "PIX", false),
            method(2, "CARTAO", false),
            method(3, "DINHEIRO", true),
        ]
    }

    fn loaded_state() -> PaymentState {
        let mut state = PaymentState::new();
        state.apply_methods(Ok(catalog()));
        state.apply_cards(Ok(vec![card(7, "tok_7"), card(8, "tok_8")]));
        state
    }

    #[test]
    fn method_kinds_follow_codes() {
        assert_eq!(method(1, "PIX", false).kind(), PaymentKind::Pix);
        assert_eq!(method(2, "cartao", false).kind(), PaymentKind::Card);
        assert_eq!(method(3, "DINHEIRO", true).kind(), PaymentKind::Cash);
        assert_eq!(method(4, "VALE", true).kind(), PaymentKind::Cash);
        assert_eq!(method(5, "VALE", false).kind(), PaymentKind::Pix);
    }

    #[test]
    fn switching_to_card_picks_first_card() -> TestResult {
        let mut state = loaded_state();

        state.select("CARTAO")?;

        assert_eq!(state.snapshot().card.map(|c| c.id), Some(CardId::new(7)));

        Ok(())
    }

    #[test]
    fn user_choice_overrides_default_card() -> TestResult {
        let mut state = loaded_state();

        state.select("CARTAO")?;
        state.select_card(CardId::new(8))?;

        assert_eq!(state.snapshot().card.map(|c| c.id), Some(CardId::new(8)));

        Ok(())
    }

    #[test]
    fn switching_away_from_card_clears_card() -> TestResult {
        let mut state = loaded_state();

        state.select("CARTAO")?;
        state.select("PIX")?;

        let snapshot = state.snapshot();
        assert!(snapshot.card.is_none());
        assert_eq!(snapshot.selection(), Some(PaymentSelection::Pix));

        Ok(())
    }

    #[test]
    fn cards_arriving_after_card_method_pick_first() -> TestResult {
        let mut state = PaymentState::new();
        state.apply_methods(Ok(catalog()));
        state.cards_loading();

        state.select("CARTAO")?;
        assert!(state.snapshot().card.is_none());

        state.apply_cards(Ok(vec![card(7, "tok_7")]));
        assert_eq!(state.snapshot().card.map(|c| c.id), Some(CardId::new(7)));

        Ok(())
    }

    #[test]
    fn select_card_without_method_is_rejected() {
        let mut state = loaded_state();

        assert_eq!(
            state.select_card(CardId::new(7)),
            Err(PaymentError::NoMethodSelected)
        );
    }

    #[test]
    fn select_card_for_pix_is_rejected() -> TestResult {
        let mut state = loaded_state();
        state.select("PIX")?;

        assert_eq!(
            state.select_card(CardId::new(7)),
            Err(PaymentError::CardNotAllowed)
        );

        Ok(())
    }

    #[test]
    fn unknown_method_is_rejected() {
        let mut state = loaded_state();

        assert_eq!(
            state.select("BOLETO"),
            Err(PaymentError::UnknownMethod("BOLETO".to_string()))
        );
    }

    #[test]
    fn change_amount_parses_digits() -> TestResult {
        let mut state = loaded_state();
        state.select("DINHEIRO")?;

        state.set_change_amount("5000")?;

        let snapshot = state.snapshot();
        assert_eq!(snapshot.change_for, Some(50_00));
        assert_eq!(snapshot.change_for.map(format_brl).as_deref(), Some("R$ 50,00"));
        assert_eq!(snapshot.validate(42_50, false), Ok(()));

        Ok(())
    }

    #[test]
    fn change_below_total_is_incomplete() -> TestResult {
        let mut state = loaded_state();
        state.select("DINHEIRO")?;
        state.set_change_amount("4000")?;

        assert_eq!(
            state.snapshot().validate(42_50, false),
            Err(PaymentIssue::ChangeBelowTotal(40_00, 42_50))
        );

        Ok(())
    }

    #[test]
    fn change_amount_outside_cash_is_rejected() -> TestResult {
        let mut state = loaded_state();
        state.select("PIX")?;

        assert_eq!(
            state.set_change_amount("5000"),
            Err(PaymentError::ChangeNotAllowed)
        );

        Ok(())
    }

    #[test]
    fn change_amount_ignores_letters() -> TestResult {
        let mut state = loaded_state();
        state.select("DINHEIRO")?;

        state.set_change_amount("50a00")?;
        assert_eq!(state.snapshot().change_for, Some(50_00));

        state.set_change_amount("abc")?;
        assert_eq!(state.snapshot().change_for, None);

        Ok(())
    }

    #[test]
    fn overflowing_change_amount_keeps_previous() -> TestResult {
        let mut state = loaded_state();
        state.select("DINHEIRO")?;
        state.set_change_amount("5000")?;

        let error = state.set_change_amount("99999999999999999999");
        let copy = error.clone();

        assert_eq!(
            error,
            Err(PaymentError::ChangeAmount(MoneyInputError::TooLarge))
        );
        assert_eq!(copy, error);
        assert_eq!(state.snapshot().change_for, Some(50_00));

        Ok(())
    }

    #[test]
    fn card_without_token_depends_on_flag() {
        let selection = PaymentSelection::Card { card: None };

        assert_eq!(selection.validate(10_00, false), Err(PaymentIssue::MissingCard));
        assert_eq!(selection.validate(10_00, true), Ok(()));
    }

    #[test]
    fn card_with_empty_token_is_incomplete() {
        let selection = PaymentSelection::Card {
            card: Some(card(7, "")),
        };

        assert_eq!(selection.validate(10_00, false), Err(PaymentIssue::MissingCard));
    }

    #[test]
    fn no_method_is_incomplete() {
        assert_eq!(
            PaymentSnapshot::default().validate(10_00, false),
            Err(PaymentIssue::NoMethod)
        );
    }

    #[test]
    fn failed_card_load_keeps_methods_ready() {
        let mut state = PaymentState::new();
        state.apply_methods(Ok(catalog()));
        state.apply_cards(Err("timeout".to_string()));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.methods_state, LoadState::Ready);
        assert_eq!(snapshot.cards_state, LoadState::Failed("timeout".to_string()));
    }
}

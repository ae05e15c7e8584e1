//! Address
//!
//! Delivery address form, the required-field rule used at checkout and the
//! postal code prefill from a directory lookup.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::ids::AddressId;

/// A delivery address as the backend stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Saved address id, `None` for a manually entered address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,

    /// Recipient name.
    #[serde(rename = "nomeDestinatario", default)]
    pub recipient: String,

    /// Postal code (CEP), in any punctuation.
    #[serde(rename = "cep", default)]
    pub postal_code: String,

    /// Street.
    #[serde(rename = "rua", default)]
    pub street: String,

    /// House number.
    #[serde(rename = "numero", default)]
    pub number: String,

    /// Optional complement (apartment, block).
    #[serde(rename = "complemento", default)]
    pub complement: Option<String>,

    /// District (bairro).
    #[serde(rename = "bairro", default)]
    pub district: String,

    /// City.
    #[serde(rename = "cidade", default)]
    pub city: String,

    /// State (UF).
    #[serde(rename = "estado", default)]
    pub state: String,
}

/// Required address fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    /// Recipient name.
    Recipient,
    /// Postal code.
    PostalCode,
    /// Street.
    Street,
    /// House number.
    Number,
    /// District.
    District,
    /// City.
    City,
    /// State.
    State,
}

impl AddressField {
    /// Every required field, in form order.
    pub const REQUIRED: [Self; 7] = [
        Self::Recipient,
        Self::PostalCode,
        Self::Street,
        Self::Number,
        Self::District,
        Self::City,
        Self::State,
    ];
}

impl Display for AddressField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Recipient => "recipient",
            Self::PostalCode => "postal code",
            Self::Street => "street",
            Self::Number => "number",
            Self::District => "district",
            Self::City => "city",
            Self::State => "state",
        };

        f.write_str(name)
    }
}

impl Address {
    /// Value of a required field.
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::Recipient => &self.recipient,
            AddressField::PostalCode => &self.postal_code,
            AddressField::Street => &self.street,
            AddressField::Number => &self.number,
            AddressField::District => &self.district,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
        }
    }

    /// Required fields that are empty or only whitespace.
    pub fn missing_fields(&self) -> SmallVec<[AddressField; 7]> {
        AddressField::REQUIRED
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }

    /// Whether every required field is populated.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fill fields from a directory lookup.
    ///
    /// Only non-empty lookup values overwrite; everything else the user
    /// typed is preserved.
    pub fn prefill(&mut self, lookup: &PartialAddress) {
        fill(&mut self.street, &lookup.street);
        fill(&mut self.district, &lookup.district);
        fill(&mut self.city, &lookup.city);
        fill(&mut self.state, &lookup.state);
    }
}

fn fill(target: &mut String, value: &str) {
    if !value.trim().is_empty() {
        value.clone_into(target);
    }
}

/// Address fragment returned by a postal code directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAddress {
    /// Street.
    pub street: String,
    /// District.
    pub district: String,
    /// City.
    pub city: String,
    /// State (UF).
    pub state: String,
}

/// Errors from parsing a postal code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostalCodeError {
    /// Not exactly eight digits once punctuation is stripped.
    #[error("postal code must have 8 digits, got {0}")]
    WrongLength(usize),
}

/// Brazilian postal code (CEP): exactly eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse a postal code, ignoring every non-digit character.
    ///
    /// # Errors
    ///
    /// Returns [`PostalCodeError::WrongLength`] unless eight digits remain.
    pub fn parse(raw: &str) -> Result<Self, PostalCodeError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        if digits.len() == 8 {
            Ok(Self(digits))
        } else {
            Err(PostalCodeError::WrongLength(digits.len()))
        }
    }

    /// The eight digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PostalCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

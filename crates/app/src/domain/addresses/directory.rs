//! Postal code directory.

use async_trait::async_trait;
use mockall::automock;
use sacola::address::{Address, PartialAddress, PostalCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::{ApiClient, ApiError};

/// `ViaCEP` lookup response.
#[derive(Debug, Default, Deserialize)]
struct ViaCepRecord {
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: Option<Value>,
}

impl ViaCepRecord {
    /// `ViaCEP` answers unknown codes with `"erro": true` (or `"true"`).
    fn is_unknown(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            Some(_) | None => false,
        }
    }
}

/// Directory client backed by `ViaCEP`.
#[derive(Debug, Clone)]
pub struct ViaCepDirectory {
    client: ApiClient,
}

impl ViaCepDirectory {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PostalDirectory for ViaCepDirectory {
    async fn lookup(&self, code: &PostalCode) -> Result<Option<PartialAddress>, ApiError> {
        let record: ViaCepRecord = self.client.get(&format!("ws/{code}/json/")).await?;

        if record.is_unknown() {
            return Ok(None);
        }

        Ok(Some(PartialAddress {
            street: record.logradouro,
            district: record.bairro,
            city: record.localidade,
            state: record.uf,
        }))
    }
}

#[automock]
#[async_trait]
pub trait PostalDirectory: Send + Sync {
    /// Look up the address fragment for a postal code, `None` when the
    /// code is unknown.
    async fn lookup(&self, code: &PostalCode) -> Result<Option<PartialAddress>, ApiError>;
}

/// What [`prefill_address`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Fields were filled from the directory.
    Filled,

    /// The directory does not know the code.
    InvalidCode,

    /// The postal code does not have eight digits yet; nothing was looked
    /// up.
    Skipped,

    /// The lookup failed; the address is unchanged.
    Failed(String),
}

/// Complete an address from its postal code.
///
/// Only non-empty directory fields overwrite the form. Lookup failures are
/// reported in the outcome and never change the address.
pub async fn prefill_address(
    directory: &dyn PostalDirectory,
    address: &mut Address,
) -> LookupOutcome {
    let Ok(code) = PostalCode::parse(&address.postal_code) else {
        return LookupOutcome::Skipped;
    };

    match directory.lookup(&code).await {
        Ok(Some(found)) => {
            debug!(%code, "postal code resolved");
            address.prefill(&found);

            LookupOutcome::Filled
        }
        Ok(None) => {
            debug!(%code, "postal code unknown");

            LookupOutcome::InvalidCode
        }
        Err(error) => {
            warn!(%code, %error, "postal code lookup failed");

            LookupOutcome::Failed(error.to_string())
        }
    }
}

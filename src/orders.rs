//! Orders
//!
//! Order status ordering and the monotonic merge used to reconcile the
//! status snapshot with live status events.
//!
//! Status updates may arrive in any order (the snapshot fetch and the first
//! live event race), so [`OrderTracking::apply`] only ever moves forward:
//!
//! ```text
//! Pending -> Confirmed -> Preparing -> OutForDelivery -> Completed
//!    \___________\____________\______________\-------> Cancelled
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Deserialize;

/// Order stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Received, waiting for the restaurant.
    Pending,
    /// Accepted by the restaurant.
    Confirmed,
    /// Being prepared.
    Preparing,
    /// With the courier.
    OutForDelivery,
    /// Delivered.
    Completed,
    /// Cancelled; reachable from any non-terminal stage.
    Cancelled,
}

impl OrderStatus {
    /// Parse a wire status, case-insensitively, in either the backend's
    /// Portuguese codes or English names.
    pub fn from_wire(raw: &str) -> Option<Self> {
        let normalised = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");

        match normalised.as_str() {
            "PENDENTE" | "PENDING" => Some(Self::Pending),
            "CONFIRMADO" | "CONFIRMED" => Some(Self::Confirmed),
            "EM_PREPARO" | "PREPARANDO" | "PREPARING" => Some(Self::Preparing),
            "SAIU_PARA_ENTREGA" | "OUT_FOR_DELIVERY" => Some(Self::OutForDelivery),
            "CONCLUIDO" | "ENTREGUE" | "COMPLETED" | "DELIVERED" => Some(Self::Completed),
            "CANCELADO" | "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Backend code for this status.
    pub fn code(self) -> &'static str {
        match self {
            Self::Pending => "PENDENTE",
            Self::Confirmed => "CONFIRMADO",
            Self::Preparing => "EM_PREPARO",
            Self::OutForDelivery => "SAIU_PARA_ENTREGA",
            Self::Completed => "CONCLUIDO",
            Self::Cancelled => "CANCELADO",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Position in the forward progression. `Cancelled` has no rank.
    fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Preparing => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Completed => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether moving from `self` to `next` goes forward.
    pub fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }

        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(next)) => next > current,
            (None, Some(_)) => false,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out for delivery",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };

        f.write_str(label)
    }
}

/// A status update from either the snapshot fetch or the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusEvent {
    /// Raw status text as received.
    pub status: Option<String>,

    /// Delivery code, when the update carries one.
    pub delivery_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    status: Option<String>,

    #[serde(default)]
    mensagem: Option<String>,

    #[serde(default, alias = "codigo_entrega")]
    delivery_code: Option<String>,
}

impl StatusEvent {
    /// Parse a live channel message.
    ///
    /// Messages are JSON objects with a `status` (or `mensagem`) field and an
    /// optional `delivery_code`. Anything that does not parse as such is kept
    /// as an opaque status string.
    pub fn parse(message: &str) -> Self {
        match serde_json::from_str::<StatusPayload>(message) {
            Ok(payload) if payload.status.is_some() || payload.mensagem.is_some() => Self {
                status: payload.status.or(payload.mensagem),
                delivery_code: payload.delivery_code,
            },
            Ok(payload) if payload.delivery_code.is_some() => Self {
                status: None,
                delivery_code: payload.delivery_code,
            },
            Ok(_) | Err(_) => Self {
                status: Some(message.trim().trim_matches('"').to_string()),
                delivery_code: None,
            },
        }
    }

    /// Recognised stage named by this event.
    pub fn stage(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(OrderStatus::from_wire)
    }
}

/// What [`OrderTracking::apply`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// The displayed status moved forward.
    pub status_changed: bool,

    /// The delivery code was set or replaced.
    pub code_changed: bool,

    /// The event named a status that is not a known stage.
    pub unrecognised: Option<String>,

    /// The event named a known stage that is not after the current one.
    pub stale: Option<OrderStatus>,
}

impl MergeOutcome {
    /// Whether the tracking state changed.
    pub fn changed(&self) -> bool {
        self.status_changed || self.code_changed
    }
}

/// Latest known status of one order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderTracking {
    status: Option<OrderStatus>,
    delivery_code: Option<String>,
}

impl OrderTracking {
    /// Nothing known yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed status.
    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    /// Delivery code, once seen.
    pub fn delivery_code(&self) -> Option<&str> {
        self.delivery_code.as_deref()
    }

    /// Merge an update.
    ///
    /// The status only moves forward; unknown stages and earlier stages are
    /// reported and ignored. A non-empty delivery code is kept, and an event
    /// without one never clears it.
    pub fn apply(&mut self, event: &StatusEvent) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if let Some(raw) = &event.status {
            match OrderStatus::from_wire(raw) {
                None => outcome.unrecognised = Some(raw.clone()),
                Some(next) => {
                    let advances = self.status.is_none_or(|current| current.can_advance_to(next));

                    if advances {
                        self.status = Some(next);
                        outcome.status_changed = true;
                    } else if self.status != Some(next) {
                        outcome.stale = Some(next);
                    }
                }
            }
        }

        let code = event
            .delivery_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        if let Some(code) = code {
            if self.delivery_code.as_deref() != Some(code) {
                self.delivery_code = Some(code.to_string());
                outcome.code_changed = true;
            }
        }

        outcome
    }
}

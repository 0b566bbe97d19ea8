//! POS client contract and the order specification sent to Target.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Target-side failures. `Api { status: 409, .. }` means the external
/// reference already exists — the duplicate race caught at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Network/transport failure (connect, timeout).
    Transport(String),
    /// Target answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
}

impl TargetError {
    /// The create was refused because an order with this external
    /// reference already exists.
    pub fn is_duplicate_ref(&self) -> bool {
        matches!(self, TargetError::Api { status: 409, .. })
    }
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::Transport(msg) => write!(f, "target transport error: {msg}"),
            TargetError::Api { status, message } => {
                write!(f, "target api error http {status}: {message}")
            }
            TargetError::Decode(msg) => write!(f, "target decode error: {msg}"),
        }
    }
}

impl std::error::Error for TargetError {}

// ---------------------------------------------------------------------------
// Order specification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_type_id: i64,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub discount_id: i64,
    pub amount_cents: i64,
}

/// Complete create-order request for Target.
///
/// `external_ref` is the dedup key; Target indexes it and refuses
/// duplicates, which is the final line of the at-most-once guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub establishment: String,
    pub external_ref: String,
    pub dining_option_id: i64,
    /// Orders are injected already closed/paid.
    pub order_status: String,
    pub notes: String,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub discounts: Vec<Discount>,
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Downstream POS contract. Object-safe; implementations are `Send + Sync`.
#[async_trait::async_trait]
pub trait TargetClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether an order tagged with `external_ref` already exists at the
    /// establishment. This read is the **sole source of truth** for
    /// "already processed".
    async fn find_by_external_ref(
        &self,
        establishment: &str,
        external_ref: &str,
    ) -> Result<bool, TargetError>;

    /// Create the order; returns Target's order reference.
    async fn create_order(&self, spec: &OrderSpec) -> Result<String, TargetError>;
}

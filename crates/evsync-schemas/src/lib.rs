//! evsync-schemas
//!
//! Shared domain types for the event→order connector. Pure data: no IO,
//! no clocks, no network. Every other crate depends on this one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// Confirmation state of a Source event.
///
/// Only [`EventStatus::Definite`] is eligible for order injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Definite,
    Tentative,
    Prospect,
    Lost,
    Closed,
}

impl EventStatus {
    pub fn is_eligible(&self) -> bool {
        matches!(self, EventStatus::Definite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Definite => "definite",
            EventStatus::Tentative => "tentative",
            EventStatus::Prospect => "prospect",
            EventStatus::Lost => "lost",
            EventStatus::Closed => "closed",
        }
    }
}

/// One (name, quantity) pair from the Source event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: i64,
}

/// Billing/invoice summary attached to a Source event.
///
/// Amounts are integer cents so comparisons stay exact end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    pub subtotal_cents: i64,
    pub invoice_total_cents: i64,
    pub paid_cents: i64,
    /// Whether the billing document is closed (finalized) upstream.
    pub closed: bool,
}

impl Billing {
    /// Payment fully covers the invoice.
    pub fn is_paid_in_full(&self) -> bool {
        self.paid_cents >= self.invoice_total_cents
    }
}

/// Canonical representation of one Source event.
///
/// Constructed fresh on every fetch (webhook payload or API read), never
/// mutated afterwards, never persisted — it lives for the duration of one
/// reconciliation attempt only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Opaque Source identifier, stable across retries.
    pub id: String,
    /// Key mapping to a Target destination (establishment).
    pub location_key: String,
    pub status: EventStatus,
    /// The timestamp the event concerns, already normalized to UTC.
    pub scheduled_at: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    /// `None` when the event carries no billing document; the gate maps
    /// that to `MISSING_BILLING`.
    pub billing: Option<Billing>,
}

// ---------------------------------------------------------------------------
// Dedup key
// ---------------------------------------------------------------------------

/// Derive the external reference tying one Source event to at most one
/// Target order.
///
/// This is the **canonical** derivation point: every call site — webhook
/// path, sweep path, first attempt or any replay — must use this function.
/// Same `(source_name, event_id)` ⟹ same key, which is the sole mechanism
/// preventing duplicate orders.
pub fn dedup_key(source_name: &str, event_id: &str) -> String {
    format!("{source_name}_{event_id}")
}

// ---------------------------------------------------------------------------
// Eligibility decisions
// ---------------------------------------------------------------------------

/// Terminal per-event rejection reasons. Closed set; rejected events are
/// never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    IneligibleStatus,
    UnknownLocation,
    TooLate,
    MissingBilling,
    NoLineItems,
    AuthorizationOrFetchFailure,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::IneligibleStatus => "INELIGIBLE_STATUS",
            RejectReason::UnknownLocation => "UNKNOWN_LOCATION",
            RejectReason::TooLate => "TOO_LATE",
            RejectReason::MissingBilling => "MISSING_BILLING",
            RejectReason::NoLineItems => "NO_LINE_ITEMS",
            RejectReason::AuthorizationOrFetchFailure => "AUTHORIZATION_OR_FETCH_FAILURE",
        }
    }
}

/// Non-terminal deferral reasons: the event is expected to be reconsidered
/// by the next sweep pass or a future webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeferReason {
    TooEarly,
    TooLate,
}

impl DeferReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeferReason::TooEarly => "TOO_EARLY",
            DeferReason::TooLate => "TOO_LATE",
        }
    }
}

/// Output of the eligibility gate. Pure function of
/// `(event, now, configuration)` — no side effects, fully deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityDecision {
    Proceed,
    Reject(RejectReason),
    Defer(DeferReason),
}

// ---------------------------------------------------------------------------
// Reconciliation results
// ---------------------------------------------------------------------------

/// Terminal outcome of one reconciliation engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Injected {
        order_ref: String,
        /// True when the write was suppressed by dry-run mode.
        dry_run: bool,
    },
    SkippedDuplicate,
    Rejected {
        reason: RejectReason,
    },
    Deferred {
        reason: DeferReason,
    },
    Failed {
        error: String,
    },
}

impl ReconcileOutcome {
    /// Short status label for summaries and log lines.
    pub fn status_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Injected { .. } => "INJECTED",
            ReconcileOutcome::SkippedDuplicate => "SKIPPED_DUPLICATE",
            ReconcileOutcome::Rejected { .. } => "REJECTED",
            ReconcileOutcome::Deferred { .. } => "DEFERRED",
            ReconcileOutcome::Failed { .. } => "FAILED",
        }
    }
}

/// Immutable record of one engine invocation; consumed by the webhook ack,
/// batch summary, and logs, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub event_id: String,
    pub outcome: ReconcileOutcome,
}

impl ReconciliationResult {
    pub fn new(event_id: impl Into<String>, outcome: ReconcileOutcome) -> Self {
        Self {
            event_id: event_id.into(),
            outcome,
        }
    }

    pub fn target_order_ref(&self) -> Option<&str> {
        match &self.outcome {
            ReconcileOutcome::Injected { order_ref, .. } => Some(order_ref),
            _ => None,
        }
    }

    /// Reason string for response payloads, when the outcome carries one.
    pub fn reason_str(&self) -> Option<String> {
        match &self.outcome {
            ReconcileOutcome::Rejected { reason } => Some(reason.as_str().to_string()),
            ReconcileOutcome::Deferred { reason } => Some(reason.as_str().to_string()),
            ReconcileOutcome::Failed { error } => Some(error.clone()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchSummary
// ---------------------------------------------------------------------------

/// Aggregate counters for one sweep run. Created at batch start,
/// incremented as each event resolves, immutable once the batch returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub queried: usize,
    pub injected: usize,
    pub skipped: usize,
    pub failed: usize,
    pub events: Vec<ReconciliationResult>,
}

impl BatchSummary {
    pub fn new(queried: usize) -> Self {
        Self {
            queried,
            ..Self::default()
        }
    }

    /// Fold one per-event result into the counters.
    ///
    /// Rejections and deferrals both count as `skipped`: neither produced
    /// an order, and neither is an error.
    pub fn record(&mut self, result: ReconciliationResult) {
        match &result.outcome {
            ReconcileOutcome::Injected { .. } => self.injected += 1,
            ReconcileOutcome::SkippedDuplicate
            | ReconcileOutcome::Rejected { .. }
            | ReconcileOutcome::Deferred { .. } => self.skipped += 1,
            ReconcileOutcome::Failed { .. } => self.failed += 1,
        }
        self.events.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> EventRecord {
        EventRecord {
            id: "E1".to_string(),
            location_key: "loc-1".to_string(),
            status: EventStatus::Definite,
            scheduled_at: Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap(),
            line_items: vec![LineItem {
                name: "Banquet package".to_string(),
                quantity: 2,
            }],
            billing: Some(Billing {
                subtotal_cents: 120_00,
                invoice_total_cents: 100_00,
                paid_cents: 100_00,
                closed: true,
            }),
        }
    }

    #[test]
    fn dedup_key_is_deterministic() {
        assert_eq!(dedup_key("ts", "E1"), "ts_E1");
        assert_eq!(dedup_key("ts", "E1"), dedup_key("ts", "E1"));
    }

    #[test]
    fn only_definite_is_eligible() {
        assert!(EventStatus::Definite.is_eligible());
        for s in [
            EventStatus::Tentative,
            EventStatus::Prospect,
            EventStatus::Lost,
            EventStatus::Closed,
        ] {
            assert!(!s.is_eligible(), "{s:?} must not be eligible");
        }
    }

    #[test]
    fn event_record_round_trips_through_json() {
        let ev = sample_event();
        let json = serde_json::to_string(&ev).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn batch_summary_counts_by_outcome() {
        let mut summary = BatchSummary::new(4);
        summary.record(ReconciliationResult::new(
            "E1",
            ReconcileOutcome::Injected {
                order_ref: "ord-1".to_string(),
                dry_run: false,
            },
        ));
        summary.record(ReconciliationResult::new(
            "E2",
            ReconcileOutcome::SkippedDuplicate,
        ));
        summary.record(ReconciliationResult::new(
            "E3",
            ReconcileOutcome::Rejected {
                reason: RejectReason::IneligibleStatus,
            },
        ));
        summary.record(ReconciliationResult::new(
            "E4",
            ReconcileOutcome::Failed {
                error: "target 503".to_string(),
            },
        ));

        assert_eq!(summary.queried, 4);
        assert_eq!(summary.injected, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.events.len(), 4);
    }

    #[test]
    fn paid_in_full_respects_cents() {
        let b = Billing {
            subtotal_cents: 100_00,
            invoice_total_cents: 100_00,
            paid_cents: 99_99,
            closed: true,
        };
        assert!(!b.is_paid_in_full());
    }
}

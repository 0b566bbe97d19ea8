//! Eligibility gate.
//!
//! Deterministic, pure logic. No IO. No clocks of its own — `now` is an
//! argument, so every decision is unit-testable with a fixed timestamp.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use evsync_config::{ConnectorConfig, LocationDirectory};
use evsync_schemas::{DeferReason, EligibilityDecision, EventRecord, RejectReason};

/// Decides whether an event qualifies for order creation right now.
///
/// Time policy (applied identically on both ingress paths):
/// - `now < scheduled_at - lead` → defer, too early.
/// - `scheduled_at + trailing < now <= scheduled_at + trailing + grace`
///   → defer, too late (the sweep will look again).
/// - beyond the grace window → reject, too late (final).
pub struct EligibilityGate {
    lead: Duration,
    trailing: Duration,
    grace: Duration,
    locations: Arc<LocationDirectory>,
}

impl EligibilityGate {
    pub fn new(
        lead: Duration,
        trailing: Duration,
        grace: Duration,
        locations: Arc<LocationDirectory>,
    ) -> Self {
        Self {
            lead,
            trailing,
            grace,
            locations,
        }
    }

    pub fn from_config(config: &ConnectorConfig, locations: Arc<LocationDirectory>) -> Self {
        Self::new(
            Duration::hours(config.lead_window_hours),
            Duration::hours(config.trailing_window_hours),
            Duration::hours(config.grace_window_hours),
            locations,
        )
    }

    pub fn evaluate(&self, event: &EventRecord, now: DateTime<Utc>) -> EligibilityDecision {
        if !event.status.is_eligible() {
            return EligibilityDecision::Reject(RejectReason::IneligibleStatus);
        }

        if self.locations.resolve(&event.location_key).is_none() {
            return EligibilityDecision::Reject(RejectReason::UnknownLocation);
        }

        if now < event.scheduled_at - self.lead {
            return EligibilityDecision::Defer(DeferReason::TooEarly);
        }
        let trailing_edge = event.scheduled_at + self.trailing;
        if now > trailing_edge + self.grace {
            return EligibilityDecision::Reject(RejectReason::TooLate);
        }
        if now > trailing_edge {
            return EligibilityDecision::Defer(DeferReason::TooLate);
        }

        match &event.billing {
            None => return EligibilityDecision::Reject(RejectReason::MissingBilling),
            Some(billing) => {
                if !billing.closed || !billing.is_paid_in_full() {
                    return EligibilityDecision::Reject(RejectReason::MissingBilling);
                }
            }
        }

        if event.line_items.is_empty() {
            return EligibilityDecision::Reject(RejectReason::NoLineItems);
        }

        EligibilityDecision::Proceed
    }
}

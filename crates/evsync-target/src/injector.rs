//! Order injector — the single write path into Target.
//!
//! One canonical `inject(event, mapping, dedup_key, dry_run)` contract is
//! used identically by the webhook path and the sweep path; there are no
//! caller-specific variants.

use std::sync::Arc;

use tracing::{info, warn};

use evsync_config::LocationMapping;
use evsync_schemas::EventRecord;

use crate::catalog::match_line_items;
use crate::{DedupIndex, OrderSpec, Payment, TargetClient};

/// Structured outcome of one injection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionOutcome {
    Injected {
        order_ref: String,
        /// True when the write was suppressed by dry-run mode; callers
        /// suppress notifications and audit side effects.
        dry_run: bool,
    },
    SkippedDuplicate,
    Failed(String),
}

pub struct OrderInjector {
    target: Arc<dyn TargetClient>,
    dedup: Arc<DedupIndex>,
}

impl OrderInjector {
    pub fn new(target: Arc<dyn TargetClient>, dedup: Arc<DedupIndex>) -> Self {
        Self { target, dedup }
    }

    /// Construct and submit the create-order request for an eligible,
    /// non-duplicate event.
    ///
    /// Immediately before writing, the dedup index is re-checked — this
    /// closes the window between the engine's earlier check and the write.
    /// A 409 from Target on create is the same race caught even later, and
    /// maps to `SkippedDuplicate`.
    pub async fn inject(
        &self,
        event: &EventRecord,
        mapping: &LocationMapping,
        dedup_key: &str,
        dry_run: bool,
    ) -> InjectionOutcome {
        let spec = build_order_spec(event, mapping, dedup_key);

        if dry_run {
            info!(
                event_id = %event.id,
                dedup_key,
                items = spec.items.len(),
                "dry run: order validated and mapped, write suppressed"
            );
            return InjectionOutcome::Injected {
                order_ref: format!("dry-run-{dedup_key}"),
                dry_run: true,
            };
        }

        match self.dedup.exists(&mapping.establishment, dedup_key).await {
            Ok(true) => {
                info!(event_id = %event.id, dedup_key, "duplicate caught at injector re-check");
                return InjectionOutcome::SkippedDuplicate;
            }
            Ok(false) => {}
            Err(err) => return InjectionOutcome::Failed(err.to_string()),
        }

        match self.target.create_order(&spec).await {
            Ok(order_ref) => {
                self.dedup.note_exists(dedup_key);
                info!(event_id = %event.id, dedup_key, order_ref, "order injected");
                InjectionOutcome::Injected {
                    order_ref,
                    dry_run: false,
                }
            }
            Err(err) if err.is_duplicate_ref() => {
                info!(event_id = %event.id, dedup_key, "duplicate caught at create");
                self.dedup.note_exists(dedup_key);
                InjectionOutcome::SkippedDuplicate
            }
            Err(err) => InjectionOutcome::Failed(err.to_string()),
        }
    }
}

/// Map an event to Target's order shape.
///
/// Order is injected closed; a payment row is added when the invoice total
/// is positive and a discount row when the invoice came in under subtotal
/// (comped difference).
fn build_order_spec(
    event: &EventRecord,
    mapping: &LocationMapping,
    dedup_key: &str,
) -> OrderSpec {
    let matched = match_line_items(&event.line_items, &mapping.catalog);
    for name in &matched.unmatched {
        warn!(event_id = %event.id, item = %name, "line item not in location catalog");
    }

    let billing = event.billing.unwrap_or(evsync_schemas::Billing {
        subtotal_cents: 0,
        invoice_total_cents: 0,
        paid_cents: 0,
        closed: false,
    });

    let mut payments = Vec::new();
    if billing.invoice_total_cents > 0 {
        payments.push(Payment {
            payment_type_id: mapping.payment_type_id,
            amount_cents: billing.invoice_total_cents,
        });
    }

    let mut discounts = Vec::new();
    if billing.invoice_total_cents < billing.subtotal_cents {
        discounts.push(crate::Discount {
            discount_id: mapping.discount_id,
            amount_cents: billing.subtotal_cents - billing.invoice_total_cents,
        });
    }

    OrderSpec {
        establishment: mapping.establishment.clone(),
        external_ref: dedup_key.to_string(),
        dining_option_id: mapping.dining_option_id,
        order_status: "CLOSED".to_string(),
        notes: format!("Source event #{}", event.id),
        items: matched.items,
        payments,
        discounts,
    }
}

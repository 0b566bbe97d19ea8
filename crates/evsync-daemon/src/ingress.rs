//! Webhook ingress.
//!
//! Six checks run in a fixed order for every delivery, and the kill switch
//! is always first — a tripped switch acks even deliveries with garbage
//! signatures. All outcomes come back as HTTP 200; `ok: false` in the body
//! is the only failure signal the upstream sees.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use evsync_schemas::ReconcileOutcome;
use evsync_source::{normalize_event, EventWire};

use crate::api_types::AckResponse;
use crate::dedup::delivery_key;
use crate::signature;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Trigger types that can lead to an order. Everything else acks as
/// non-actionable.
const ACTIONABLE_TRIGGERS: &[&str] = &["CREATE_EVENT", "UPDATE_EVENT"];

#[derive(Debug, Deserialize)]
struct WebhookDelivery {
    #[serde(default)]
    webhook_trigger_type: Option<String>,
    /// Upstream delivery timestamp; part of the delivery-dedup key so a
    /// genuine re-send (new timestamp) is not confused with a replay.
    #[serde(default)]
    triggered_at: Option<serde_json::Value>,
    #[serde(default)]
    event: Option<EventWire>,
}

pub(crate) async fn webhook(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<AckResponse> {
    let correlation_id = Uuid::new_v4().to_string();

    // 1. Kill switch, before everything including signature checks.
    if !st.connector_enabled() {
        info!(correlation_id, "webhook acked no-op: connector disabled");
        return Json(AckResponse::safe("CONNECTOR_DISABLED", None));
    }

    // 2. Signature over the raw body.
    if let Some(secret) = &st.signing_secret {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !signature::verify(secret, header, &body) {
            warn!(correlation_id, "webhook signature rejected");
            return Json(AckResponse::failure("SIGNATURE_INVALID", None));
        }
    }

    // 3. Parse trigger classification and event id.
    let delivery: WebhookDelivery = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(err) => {
            warn!(correlation_id, error = %err, "webhook body unparseable");
            return Json(AckResponse::failure("MALFORMED_PAYLOAD", None));
        }
    };
    let trigger = delivery.webhook_trigger_type.clone();
    let actionable = trigger
        .as_deref()
        .is_some_and(|t| ACTIONABLE_TRIGGERS.contains(&t));
    if !actionable {
        return Json(AckResponse::safe("NON_ACTIONABLE_TRIGGER", trigger));
    }
    let Some(wire) = delivery.event else {
        return Json(AckResponse::failure("MALFORMED_PAYLOAD", trigger));
    };
    let event_id = wire.id_string();

    // 4. Delivery dedup fast path.
    let delivery_ts = delivery
        .triggered_at
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| "0".to_string());
    let key = delivery_key(&wire.location_key, &event_id, &delivery_ts);
    if !st.delivery_dedup.first_seen(&key) {
        info!(correlation_id, event_id, "exact duplicate delivery dropped");
        return Json(AckResponse::safe("DUPLICATE_DELIVERY", trigger));
    }

    // 5. Location allowlist.
    if !st.config.location_allowed(&wire.location_key) {
        return Json(AckResponse::safe("LOCATION_NOT_ALLOWED", trigger));
    }

    // 6. Reconcile with the inline payload, bounded.
    let record = match normalize_event(&wire, &st.locations) {
        Ok(record) => record,
        Err(err) => {
            warn!(correlation_id, event_id, error = %err, "inline payload rejected");
            return Json(AckResponse::failure("MALFORMED_PAYLOAD", trigger));
        }
    };

    let outcome = tokio::time::timeout(
        st.config.webhook_timeout(),
        st.engine.reconcile(&event_id, Some(&record), &correlation_id),
    )
    .await;

    let ack = match outcome {
        Err(_) => {
            warn!(correlation_id, event_id, "webhook reconcile timed out");
            AckResponse::failure("TIMEOUT", trigger)
        }
        Ok(result) => match &result.outcome {
            ReconcileOutcome::Injected { .. } => AckResponse {
                ok: true,
                processed: true,
                reason: None,
                trigger,
            },
            ReconcileOutcome::SkippedDuplicate => AckResponse::safe("SKIPPED_DUPLICATE", trigger),
            ReconcileOutcome::Rejected { reason } => AckResponse::safe(reason.as_str(), trigger),
            ReconcileOutcome::Deferred { reason } => AckResponse::safe(reason.as_str(), trigger),
            ReconcileOutcome::Failed { error } => AckResponse::failure(error, trigger),
        },
    };
    Json(ack)
}

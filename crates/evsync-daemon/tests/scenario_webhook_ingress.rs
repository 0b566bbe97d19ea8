//! In-process scenario tests for the webhook ingress path.
//!
//! These tests spin up the Axum router **without** binding a TCP socket:
//! each test builds `routes::build_router` over fakes and drives it via
//! `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt; // oneshot

use evsync_config::ConnectorConfig;
use evsync_daemon::{ingress::SIGNATURE_HEADER, routes, signature, state::AppState};
use evsync_reconcile::BatchReconciler;
use evsync_testkit::{build_engine, EngineHandle};

const SECRET: &str = "whsec_fixture_only";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct TestCtx {
    router: axum::Router,
    handle: EngineHandle,
}

fn make_ctx(config: ConnectorConfig) -> TestCtx {
    let handle = build_engine(&config, config.dry_run);
    let batch = Arc::new(BatchReconciler::new(
        handle.engine.clone(),
        handle.source.clone(),
        config.batch_concurrency,
        Duration::from_secs(config.event_timeout_secs),
    ));
    let state = Arc::new(AppState::new(
        Arc::new(config),
        handle.locations.clone(),
        handle.engine.clone(),
        batch,
        Some(SECRET.to_string()),
    ));
    TestCtx {
        router: routes::build_router(state),
        handle,
    }
}

/// A valid delivery body for an event that passes every gate check.
fn delivery_body(event_id: &str, location_key: &str, triggered_at: u64) -> String {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    serde_json::json!({
        "webhook_trigger_type": "CREATE_EVENT",
        "triggered_at": triggered_at,
        "event": {
            "id": event_id,
            "location_key": location_key,
            "status": "definite",
            "event_date": today,
            "start_time": "12:00",
            "line_items": [
                { "name": "Banquet package", "quantity": 2 }
            ],
            "billing": {
                "subtotal_cents": 25000,
                "invoice_total_cents": 20000,
                "paid_cents": 20000,
                "closed": true
            }
        }
    })
    .to_string()
}

fn signed_request(body: &str) -> Request<axum::body::Body> {
    let header = signature::sign(SECRET, "1767225600", body.as_bytes());
    Request::builder()
        .method("POST")
        .uri("/v1/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, header)
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

async fn call(
    router: axum::Router,
    req: Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("body is not valid JSON");
    (status, json)
}

// ---------------------------------------------------------------------------
// Kill switch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn kill_switch_precedes_even_signature_checks() {
    let ctx = make_ctx(ConnectorConfig {
        kill_switch: true,
        ..ConnectorConfig::default()
    });

    // Garbage signature on purpose: the kill switch must answer first.
    let req = Request::builder()
        .method("POST")
        .uri("/v1/webhook")
        .header(SIGNATURE_HEADER, "t=0,v1=deadbeef")
        .body(axum::body::Body::from(delivery_body("E1", "loc-1", 100)))
        .unwrap();

    let (status, json) = call(ctx.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["processed"], false);
    assert_eq!(json["reason"], "CONNECTOR_DISABLED");
    assert_eq!(ctx.handle.source.get_calls(), 0);
    assert_eq!(ctx.handle.target.create_calls(), 0);
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tampered_signature_is_refused_before_any_reconcile() {
    let ctx = make_ctx(ConnectorConfig::default());
    let body = delivery_body("E1", "loc-1", 100);

    let mut header = signature::sign(SECRET, "1767225600", body.as_bytes());
    // Corrupt one hex digit of the MAC.
    let last = header.pop().unwrap();
    header.push(if last == '0' { '1' } else { '0' });

    let req = Request::builder()
        .method("POST")
        .uri("/v1/webhook")
        .header(SIGNATURE_HEADER, header)
        .body(axum::body::Body::from(body))
        .unwrap();

    let (status, json) = call(ctx.router, req).await;
    assert_eq!(status, StatusCode::OK, "always HTTP 200, even on our failures");
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "SIGNATURE_INVALID");
    assert_eq!(ctx.handle.source.get_calls(), 0);
    assert_eq!(ctx.handle.target.find_calls(), 0);
    assert_eq!(ctx.handle.target.create_calls(), 0);
}

#[tokio::test]
async fn missing_signature_header_is_refused() {
    let ctx = make_ctx(ConnectorConfig::default());
    let body = delivery_body("E1", "loc-1", 100);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/webhook")
        .body(axum::body::Body::from(body))
        .unwrap();

    let (_, json) = call(ctx.router, req).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "SIGNATURE_INVALID");
}

// ---------------------------------------------------------------------------
// Trigger classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_actionable_trigger_acks_without_processing() {
    let ctx = make_ctx(ConnectorConfig::default());
    let body = delivery_body("E1", "loc-1", 100).replace("CREATE_EVENT", "DELETE_EVENT");

    let (_, json) = call(ctx.router, signed_request(&body)).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["processed"], false);
    assert_eq!(json["reason"], "NON_ACTIONABLE_TRIGGER");
    assert_eq!(json["trigger"], "DELETE_EVENT");
    assert_eq!(ctx.handle.target.create_calls(), 0);
}

#[tokio::test]
async fn unparseable_body_fails_safe_with_200() {
    let ctx = make_ctx(ConnectorConfig::default());
    let body = "{not json";

    let (status, json) = call(ctx.router, signed_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "MALFORMED_PAYLOAD");
}

// ---------------------------------------------------------------------------
// Delivery dedup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exact_duplicate_delivery_short_circuits() {
    let ctx = make_ctx(ConnectorConfig::default());
    let body = delivery_body("E1", "loc-1", 100);

    let (_, first) = call(ctx.router.clone(), signed_request(&body)).await;
    assert_eq!(first["processed"], true);

    let (_, second) = call(ctx.router, signed_request(&body)).await;
    assert_eq!(second["ok"], true);
    assert_eq!(second["processed"], false);
    assert_eq!(second["reason"], "DUPLICATE_DELIVERY");
    assert_eq!(
        ctx.handle.target.create_calls(),
        1,
        "duplicate delivery never reaches the engine"
    );
}

#[tokio::test]
async fn redelivery_with_new_timestamp_skips_via_dedup_index() {
    let ctx = make_ctx(ConnectorConfig::default());

    let (_, first) = call(ctx.router.clone(), signed_request(&delivery_body("E1", "loc-1", 100))).await;
    assert_eq!(first["processed"], true);

    // A genuine re-send (new delivery timestamp) passes the fast path and
    // must be caught by the authoritative dedup index instead.
    let (_, second) = call(ctx.router, signed_request(&delivery_body("E1", "loc-1", 200))).await;
    assert_eq!(second["ok"], true);
    assert_eq!(second["processed"], false);
    assert_eq!(second["reason"], "SKIPPED_DUPLICATE");
    assert_eq!(ctx.handle.target.order_count(), 1);
}

// ---------------------------------------------------------------------------
// Location allowlist
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disallowed_location_acks_without_processing() {
    let ctx = make_ctx(ConnectorConfig {
        allowed_locations: Some(["loc-2".to_string()].into_iter().collect()),
        ..ConnectorConfig::default()
    });

    let (_, json) = call(ctx.router, signed_request(&delivery_body("E1", "loc-1", 100))).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["processed"], false);
    assert_eq!(json["reason"], "LOCATION_NOT_ALLOWED");
    assert_eq!(ctx.handle.target.create_calls(), 0);
}

// ---------------------------------------------------------------------------
// Happy path and outcome mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_delivery_injects_exactly_one_order() {
    let ctx = make_ctx(ConnectorConfig::default());

    let (status, json) = call(ctx.router, signed_request(&delivery_body("E1", "loc-1", 100))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["processed"], true);
    assert_eq!(json["trigger"], "CREATE_EVENT");
    assert!(json.get("reason").is_none());

    assert_eq!(ctx.handle.target.order_count(), 1);
    assert!(
        ctx.handle.target.order_ref_for("ts_E1").is_some(),
        "order carries the canonical external ref"
    );
    assert_eq!(
        ctx.handle.source.get_calls(),
        0,
        "inline payload means zero source reads"
    );
}

#[tokio::test]
async fn ineligible_event_acks_with_reject_reason() {
    let ctx = make_ctx(ConnectorConfig::default());
    let body = delivery_body("E1", "loc-1", 100).replace("\"definite\"", "\"tentative\"");

    let (_, json) = call(ctx.router, signed_request(&body)).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["processed"], false);
    assert_eq!(json["reason"], "INELIGIBLE_STATUS");
    assert_eq!(ctx.handle.target.create_calls(), 0);
}

#[tokio::test]
async fn dry_run_delivery_acks_processed_without_writing() {
    let ctx = make_ctx(ConnectorConfig {
        dry_run: true,
        ..ConnectorConfig::default()
    });

    let (_, json) = call(ctx.router, signed_request(&delivery_body("E1", "loc-1", 100))).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["processed"], true);
    assert_eq!(ctx.handle.target.create_calls(), 0);
    assert_eq!(ctx.handle.target.order_count(), 0);
}

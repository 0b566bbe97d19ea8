//! Axum router and HTTP handlers for evsync-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and
//! attaches middleware layers. Handlers are `pub(crate)` so the scenario
//! tests in `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use evsync_schemas::{BatchSummary, ReconcileOutcome, ReconciliationResult};

use crate::api_types::{
    ConnectorStateResponse, HealthResponse, SyncEventEntry, SyncParams, SyncResponse, SyncSummary,
};
use crate::ingress;
use crate::state::AppState;

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (tracing) are **not** applied here; `main.rs` attaches
/// them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/webhook", post(ingress::webhook))
        .route("/v1/sync", get(sync))
        .route("/v1/connector/enable", post(connector_enable))
        .route("/v1/connector/disable", post(connector_disable))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            now: chrono::Utc::now().to_rfc3339(),
            connector_enabled: st.connector_enabled(),
            locations: st.locations.len(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/sync
// ---------------------------------------------------------------------------

/// Synchronous reconciliation: `?event_id=<id>` for one event,
/// `?hours_back=<n>` (or nothing, defaulting to the configured lookback)
/// for a bulk pass over the window.
pub(crate) async fn sync(
    State(st): State<Arc<AppState>>,
    Query(params): Query<SyncParams>,
) -> impl IntoResponse {
    if !st.connector_enabled() {
        let mode = if params.event_id.is_some() { "single" } else { "bulk" };
        return (
            StatusCode::OK,
            Json(SyncResponse {
                success: false,
                mode: mode.to_string(),
                summary: SyncSummary {
                    queried: 0,
                    injected: 0,
                    skipped: 0,
                    failed: 0,
                },
                events: vec![],
                reason: Some("CONNECTOR_DISABLED".to_string()),
            }),
        );
    }

    let correlation_id = Uuid::new_v4().to_string();

    let response = match params.event_id {
        Some(event_id) => {
            // Same bound as the webhook path; the manual path gets no
            // special license to hang.
            let run = tokio::time::timeout(
                st.config.webhook_timeout(),
                st.engine.reconcile(&event_id, None, &correlation_id),
            )
            .await;
            let result = run.unwrap_or_else(|_| {
                ReconciliationResult::new(
                    event_id,
                    ReconcileOutcome::Failed {
                        error: "TIMEOUT".to_string(),
                    },
                )
            });
            let mut summary = BatchSummary::new(1);
            summary.record(result);
            summary_response("single", summary)
        }
        None => {
            let hours = params.hours_back.unwrap_or(st.config.lookback_hours).max(1);
            let run = tokio::time::timeout(
                st.config.batch_timeout(),
                st.batch
                    .run_batch(chrono::Duration::hours(hours), &correlation_id),
            )
            .await;
            match run {
                Ok(Ok(summary)) => summary_response("bulk", summary),
                Ok(Err(err)) => sync_error("bulk", &err.to_string()),
                Err(_) => sync_error("bulk", "TIMEOUT"),
            }
        }
    };
    (StatusCode::OK, Json(response))
}

fn summary_response(mode: &str, summary: BatchSummary) -> SyncResponse {
    SyncResponse {
        success: summary.failed == 0,
        mode: mode.to_string(),
        summary: SyncSummary {
            queried: summary.queried,
            injected: summary.injected,
            skipped: summary.skipped,
            failed: summary.failed,
        },
        events: summary.events.iter().map(event_entry).collect(),
        reason: None,
    }
}

fn event_entry(result: &ReconciliationResult) -> SyncEventEntry {
    SyncEventEntry {
        id: result.event_id.clone(),
        status: result.outcome.status_str().to_string(),
        target_order_ref: result.target_order_ref().map(str::to_string),
        reason: result.reason_str(),
    }
}

fn sync_error(mode: &str, reason: &str) -> SyncResponse {
    SyncResponse {
        success: false,
        mode: mode.to_string(),
        summary: SyncSummary {
            queried: 0,
            injected: 0,
            skipped: 0,
            failed: 0,
        },
        events: vec![],
        reason: Some(reason.to_string()),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/connector/enable  /v1/connector/disable
// ---------------------------------------------------------------------------

pub(crate) async fn connector_enable(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    st.set_connector_enabled(true);
    info!("connector enabled by operator");
    (StatusCode::OK, Json(ConnectorStateResponse { enabled: true }))
}

pub(crate) async fn connector_disable(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    st.set_connector_enabled(false);
    info!("connector disabled by operator");
    (
        StatusCode::OK,
        Json(ConnectorStateResponse { enabled: false }),
    )
}

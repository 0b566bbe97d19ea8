//! Request and response types for all evsync-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// POST /v1/webhook
// ---------------------------------------------------------------------------

/// Webhook acknowledgment. Always returned with HTTP 200: a non-2xx status
/// would make the upstream's retry policy amplify legitimate rejections
/// into repeated redelivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    /// False only for failures on our side (bad signature, engine error,
    /// timeout); business rejections ack with `ok: true`.
    pub ok: bool,
    /// True only when an order was actually injected.
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl AckResponse {
    pub fn safe(reason: &str, trigger: Option<String>) -> Self {
        Self {
            ok: true,
            processed: false,
            reason: Some(reason.to_string()),
            trigger,
        }
    }

    pub fn failure(reason: &str, trigger: Option<String>) -> Self {
        Self {
            ok: false,
            processed: false,
            reason: Some(reason.to_string()),
            trigger,
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SyncParams {
    pub event_id: Option<String>,
    pub hours_back: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub queried: usize,
    pub injected: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEventEntry {
    pub id: String,
    /// "INJECTED" | "SKIPPED_DUPLICATE" | "REJECTED" | "DEFERRED" | "FAILED"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_order_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    /// "single" | "bulk"
    pub mode: String,
    pub summary: SyncSummary,
    pub events: Vec<SyncEventEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub now: String,
    pub connector_enabled: bool,
    pub locations: usize,
}

// ---------------------------------------------------------------------------
// POST /v1/connector/enable  /v1/connector/disable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorStateResponse {
    pub enabled: bool,
}

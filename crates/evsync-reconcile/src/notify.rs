//! Outcome notification seam.
//!
//! Fire-and-forget: sinks handle their own failures internally and the
//! engine never lets a notification problem change a reconciliation
//! outcome. The shipped sink logs; richer sinks (email, chat) plug in
//! behind the same trait.

use tracing::{error, info};

#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_success(&self, event_id: &str, order_ref: &str);
    async fn notify_failure(&self, event_id: &str, reason: &str);
}

/// Log-backed sink.
pub struct LogNotifier;

#[async_trait::async_trait]
impl NotificationSink for LogNotifier {
    async fn notify_success(&self, event_id: &str, order_ref: &str) {
        info!(event_id, order_ref, "event injected into target");
    }

    async fn notify_failure(&self, event_id: &str, reason: &str) {
        error!(event_id, reason, "event reconciliation failed");
    }
}

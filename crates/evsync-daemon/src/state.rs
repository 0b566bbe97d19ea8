//! Shared runtime state for evsync-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Configuration is an
//! immutable snapshot; the only mutable piece is the kill switch, held as
//! an `AtomicBool` so flips are wait-free and take effect for the next
//! request without touching in-flight ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evsync_config::{ConnectorConfig, LocationDirectory};
use evsync_reconcile::{BatchReconciler, ReconciliationEngine};

use crate::dedup::DeliveryDedup;

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "evsync-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Shared handle across all Axum handlers and the scheduler task.
pub struct AppState {
    pub config: Arc<ConnectorConfig>,
    pub locations: Arc<LocationDirectory>,
    pub engine: Arc<ReconciliationEngine>,
    pub batch: Arc<BatchReconciler>,
    /// Webhook delivery fast-path dedup (best effort, not correctness).
    pub delivery_dedup: DeliveryDedup,
    /// HMAC secret for webhook signature verification. `None` disables
    /// verification (local development only).
    pub signing_secret: Option<String>,
    pub build: BuildInfo,
    kill_switch: AtomicBool,
}

impl AppState {
    pub fn new(
        config: Arc<ConnectorConfig>,
        locations: Arc<LocationDirectory>,
        engine: Arc<ReconciliationEngine>,
        batch: Arc<BatchReconciler>,
        signing_secret: Option<String>,
    ) -> Self {
        let kill_switch = AtomicBool::new(config.kill_switch);
        Self {
            config,
            locations,
            engine,
            batch,
            delivery_dedup: DeliveryDedup::default(),
            signing_secret,
            build: BuildInfo::default(),
            kill_switch,
        }
    }

    /// Whether the connector is currently processing (kill switch not
    /// tripped). Wait-free.
    pub fn connector_enabled(&self) -> bool {
        !self.kill_switch.load(Ordering::Relaxed)
    }

    pub fn set_connector_enabled(&self, enabled: bool) {
        self.kill_switch.store(!enabled, Ordering::Relaxed);
    }
}

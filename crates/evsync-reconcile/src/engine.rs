//! Per-event reconciliation state machine.
//!
//! `FETCHING → EVALUATING → DEDUP_CHECKING → INJECTING → DONE`, with the
//! terminal outcomes of [`ReconcileOutcome`]. For a fixed event id, any
//! number of concurrent or sequential invocations produce at most one
//! `Injected` outcome system-wide; that guarantee is enforced jointly by
//! the dedup check here and the injector's pre-write re-check, not by
//! either alone.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use evsync_config::LocationDirectory;
use evsync_schemas::{
    dedup_key, EligibilityDecision, EventRecord, ReconcileOutcome, ReconciliationResult,
    RejectReason,
};
use evsync_source::{EventFetcher, SourceError};
use evsync_target::{DedupIndex, InjectionOutcome, OrderInjector};

use crate::{EligibilityGate, NotificationSink};

pub struct ReconciliationEngine {
    fetcher: EventFetcher,
    gate: EligibilityGate,
    dedup: Arc<DedupIndex>,
    injector: OrderInjector,
    locations: Arc<LocationDirectory>,
    notifier: Arc<dyn NotificationSink>,
    source_name: String,
    dry_run: bool,
}

impl ReconciliationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: EventFetcher,
        gate: EligibilityGate,
        dedup: Arc<DedupIndex>,
        injector: OrderInjector,
        locations: Arc<LocationDirectory>,
        notifier: Arc<dyn NotificationSink>,
        source_name: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            fetcher,
            gate,
            dedup,
            injector,
            locations,
            notifier,
            source_name: source_name.into(),
            dry_run,
        }
    }

    /// Run the state machine for one event id.
    ///
    /// `inline` carries the webhook payload when available (payload-first);
    /// the sweep passes `None`. Both paths behave identically from the
    /// evaluation step onward.
    pub async fn reconcile(
        &self,
        event_id: &str,
        inline: Option<&EventRecord>,
        correlation_id: &str,
    ) -> ReconciliationResult {
        let outcome = self.run(event_id, inline, correlation_id).await;
        info!(
            correlation_id,
            event_id,
            outcome = outcome.status_str(),
            "reconcile done"
        );
        ReconciliationResult::new(event_id, outcome)
    }

    async fn run(
        &self,
        event_id: &str,
        inline: Option<&EventRecord>,
        correlation_id: &str,
    ) -> ReconcileOutcome {
        // FETCHING
        let event = match self.fetcher.fetch(event_id, inline).await {
            Ok(event) => event,
            Err(SourceError::NotFound) | Err(SourceError::Unauthorized) => {
                warn!(correlation_id, event_id, "event unreadable from source");
                return ReconcileOutcome::Rejected {
                    reason: RejectReason::AuthorizationOrFetchFailure,
                };
            }
            Err(err) => {
                self.notifier.notify_failure(event_id, err.label()).await;
                return ReconcileOutcome::Failed {
                    error: format!("{}: {err}", err.label()),
                };
            }
        };

        // EVALUATING
        match self.gate.evaluate(&event, Utc::now()) {
            EligibilityDecision::Reject(reason) => {
                info!(correlation_id, event_id, reason = reason.as_str(), "rejected");
                return ReconcileOutcome::Rejected { reason };
            }
            EligibilityDecision::Defer(reason) => {
                info!(correlation_id, event_id, reason = reason.as_str(), "deferred");
                return ReconcileOutcome::Deferred { reason };
            }
            EligibilityDecision::Proceed => {}
        }

        // The gate verified the location resolves; re-resolve for the
        // mapping details.
        let Some(mapping) = self.locations.resolve(&event.location_key) else {
            return ReconcileOutcome::Rejected {
                reason: RejectReason::UnknownLocation,
            };
        };

        let key = dedup_key(&self.source_name, event_id);

        // DEDUP_CHECKING
        match self.dedup.exists(&mapping.establishment, &key).await {
            Ok(true) => return ReconcileOutcome::SkippedDuplicate,
            Ok(false) => {}
            Err(err) => {
                self.notifier
                    .notify_failure(event_id, &err.to_string())
                    .await;
                return ReconcileOutcome::Failed {
                    error: err.to_string(),
                };
            }
        }

        // INJECTING
        match self
            .injector
            .inject(&event, mapping, &key, self.dry_run)
            .await
        {
            InjectionOutcome::Injected { order_ref, dry_run } => {
                if !dry_run {
                    self.notifier.notify_success(event_id, &order_ref).await;
                }
                ReconcileOutcome::Injected { order_ref, dry_run }
            }
            InjectionOutcome::SkippedDuplicate => ReconcileOutcome::SkippedDuplicate,
            InjectionOutcome::Failed(error) => {
                self.notifier.notify_failure(event_id, &error).await;
                ReconcileOutcome::Failed { error }
            }
        }
    }
}

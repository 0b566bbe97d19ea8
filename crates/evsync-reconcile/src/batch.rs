//! Batch sweep over a trailing lookback window.
//!
//! The sweep is the safety net for missed or dropped webhooks: it
//! enumerates recently updated events and runs each through the same
//! engine the webhook path uses. Failures are isolated per event — one
//! bad event never aborts the rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::{stream, StreamExt};
use tracing::{info, warn};

use evsync_schemas::{BatchSummary, ReconcileOutcome, ReconciliationResult};
use evsync_source::{SourceError, SourceReadClient};

use crate::ReconciliationEngine;

/// Upper bound on ids requested per sweep when Source cannot filter by
/// modification time precisely.
const LIST_LIMIT: usize = 200;

pub struct BatchReconciler {
    engine: Arc<ReconciliationEngine>,
    source: Arc<dyn SourceReadClient>,
    concurrency: usize,
    event_timeout: Duration,
}

impl BatchReconciler {
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        source: Arc<dyn SourceReadClient>,
        concurrency: usize,
        event_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            concurrency: concurrency.max(1),
            event_timeout,
        }
    }

    /// Reconcile every candidate event updated within `lookback`.
    ///
    /// Events run with bounded concurrency and a per-event timeout; a
    /// timed-out event is recorded as `Failed(TIMEOUT)` and the batch
    /// continues. Only enumeration itself can fail the whole run.
    pub async fn run_batch(
        &self,
        lookback: chrono::Duration,
        correlation_id: &str,
    ) -> Result<BatchSummary, SourceError> {
        // An operator-supplied window can exceed the representable range;
        // that is a classified failure, not a panic.
        let since = Utc::now().checked_sub_signed(lookback).ok_or_else(|| {
            SourceError::Unknown(format!(
                "lookback window out of range: {}h",
                lookback.num_hours()
            ))
        })?;
        let ids = self
            .source
            .list_recent_event_ids(since, LIST_LIMIT)
            .await?;

        info!(
            correlation_id,
            candidates = ids.len(),
            since = %since.to_rfc3339(),
            "sweep started"
        );

        let mut summary = BatchSummary::new(ids.len());
        let results: Vec<ReconciliationResult> = stream::iter(ids)
            .map(|id| {
                let engine = Arc::clone(&self.engine);
                let correlation_id = correlation_id.to_string();
                let timeout = self.event_timeout;
                async move {
                    match tokio::time::timeout(
                        timeout,
                        engine.reconcile(&id, None, &correlation_id),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(correlation_id, event_id = %id, "per-event timeout in sweep");
                            ReconciliationResult::new(
                                id,
                                ReconcileOutcome::Failed {
                                    error: "TIMEOUT".to_string(),
                                },
                            )
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for result in results {
            summary.record(result);
        }

        info!(
            correlation_id,
            queried = summary.queried,
            injected = summary.injected,
            skipped = summary.skipped,
            failed = summary.failed,
            "sweep complete"
        );
        Ok(summary)
    }
}

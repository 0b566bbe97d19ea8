//! Periodic sweep scheduler.
//!
//! One background task: every `sync_interval_minutes` it runs a batch over
//! the configured lookback window. The interval bounds reconciliation lag
//! after a missed webhook; it is a policy knob, not a correctness
//! requirement.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

pub fn spawn_sweep(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.sweep_interval());
        // The first tick fires immediately; skip it so boot isn't followed
        // by an instant full sweep.
        ticker.tick().await;
        loop {
            ticker.tick().await;

            if !state.connector_enabled() {
                info!("sweep skipped: connector disabled");
                continue;
            }

            let correlation_id = format!("sweep-{}", Uuid::new_v4());
            let lookback = chrono::Duration::hours(state.config.lookback_hours);
            let run = tokio::time::timeout(
                state.config.batch_timeout(),
                state.batch.run_batch(lookback, &correlation_id),
            )
            .await;

            match run {
                Ok(Ok(summary)) => info!(
                    correlation_id,
                    queried = summary.queried,
                    injected = summary.injected,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "scheduled sweep finished"
                ),
                Ok(Err(err)) => warn!(correlation_id, error = %err, "scheduled sweep could not enumerate"),
                Err(_) => warn!(correlation_id, "scheduled sweep hit the batch timeout"),
            }
        }
    });
}

//! Payload-first event fetching with a single inline transient retry.

use std::sync::Arc;

use evsync_schemas::EventRecord;
use tracing::{debug, warn};

use crate::{SourceError, SourceReadClient};

/// Retrieves one event's canonical data, preferring an inline webhook
/// payload over a network read.
pub struct EventFetcher {
    client: Arc<dyn SourceReadClient>,
}

impl EventFetcher {
    pub fn new(client: Arc<dyn SourceReadClient>) -> Self {
        Self { client }
    }

    /// Fetch the event.
    ///
    /// - With a complete `inline` payload: returned directly, zero network
    ///   calls (payload-first policy).
    /// - Otherwise: one read against Source, retried **once** and only on a
    ///   transient failure. `NotFound` / `Unauthorized` return immediately;
    ///   retrying those would mask a real denial as a flake.
    pub async fn fetch(
        &self,
        event_id: &str,
        inline: Option<&EventRecord>,
    ) -> Result<EventRecord, SourceError> {
        if let Some(record) = inline {
            debug!(event_id, "using inline webhook payload, skipping source read");
            return Ok(record.clone());
        }

        match self.client.get_event(event_id).await {
            Ok(record) => Ok(record),
            Err(err) if err.is_retryable() => {
                warn!(event_id, error = %err, "source read failed transiently, retrying once");
                self.client.get_event(event_id).await
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use evsync_schemas::EventStatus;

    /// Scripted stub: pops one response per call, counts calls.
    struct ScriptedClient {
        script: Mutex<Vec<Result<EventRecord, SourceError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<EventRecord, SourceError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SourceReadClient for ScriptedClient {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn get_event(&self, _event_id: &str) -> Result<EventRecord, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(SourceError::Unknown("script exhausted".to_string())))
        }

        async fn list_recent_event_ids(
            &self,
            _since: chrono::DateTime<Utc>,
            _limit: usize,
        ) -> Result<Vec<String>, SourceError> {
            Ok(vec![])
        }
    }

    fn record(id: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            location_key: "loc-1".to_string(),
            status: EventStatus::Definite,
            scheduled_at: Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap(),
            line_items: vec![],
            billing: None,
        }
    }

    #[tokio::test]
    async fn inline_payload_makes_zero_network_calls() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let fetcher = EventFetcher::new(client.clone());

        let inline = record("E1");
        let got = fetcher.fetch("E1", Some(&inline)).await.unwrap();
        assert_eq!(got, inline);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        // Script pops from the back: first Transient, then Ok.
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(record("E1")),
            Err(SourceError::Transient("503".to_string())),
        ]));
        let fetcher = EventFetcher::new(client.clone());

        let got = fetcher.fetch("E1", None).await.unwrap();
        assert_eq!(got.id, "E1");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn transient_exhaustion_surfaces_transient() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(SourceError::Transient("503 again".to_string())),
            Err(SourceError::Transient("503".to_string())),
        ]));
        let fetcher = EventFetcher::new(client.clone());

        let err = fetcher.fetch("E1", None).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(client.calls(), 2, "exactly one retry, no loop");
    }

    #[tokio::test]
    async fn not_found_is_never_retried() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(record("E1")),
            Err(SourceError::NotFound),
        ]));
        let fetcher = EventFetcher::new(client.clone());

        let err = fetcher.fetch("E1", None).await.unwrap_err();
        assert_eq!(err, SourceError::NotFound);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn unauthorized_is_never_retried() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(record("E1")),
            Err(SourceError::Unauthorized),
        ]));
        let fetcher = EventFetcher::new(client.clone());

        let err = fetcher.fetch("E1", None).await.unwrap_err();
        assert_eq!(err, SourceError::Unauthorized);
        assert_eq!(client.calls(), 1);
    }
}

//! HTTP implementation of [`SourceReadClient`] over the Source REST API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use evsync_config::LocationDirectory;
use evsync_schemas::EventRecord;

use crate::wire::{normalize_event, EventWire};
use crate::{SourceError, SourceReadClient};

/// Read-only HTTP client for the Source API.
///
/// Authenticates with a read-scoped bearer token. This token must never be
/// a write-capable or user-delegated credential; see the crate docs.
pub struct HttpSourceClient {
    http: reqwest::Client,
    base_url: String,
    read_token: String,
    locations: Arc<LocationDirectory>,
}

#[derive(Deserialize)]
struct EventEnvelope {
    event: EventWire,
}

#[derive(Deserialize)]
struct EventListEnvelope {
    events: Vec<EventWire>,
}

impl HttpSourceClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        read_token: impl Into<String>,
        locations: Arc<LocationDirectory>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            read_token: read_token.into(),
            locations,
        }
    }

    /// Map a transport/HTTP failure into the closed [`SourceError`] set.
    fn classify_status(status: reqwest::StatusCode, body_hint: &str) -> SourceError {
        match status.as_u16() {
            404 => SourceError::NotFound,
            401 | 403 => SourceError::Unauthorized,
            429 => SourceError::Transient(format!("rate limited: {body_hint}")),
            500..=599 => SourceError::Transient(format!("http {status}: {body_hint}")),
            other => SourceError::Unknown(format!("http {other}: {body_hint}")),
        }
    }

    fn classify_transport(err: reqwest::Error) -> SourceError {
        if err.is_timeout() || err.is_connect() {
            SourceError::Transient(err.to_string())
        } else if err.is_decode() {
            SourceError::Unknown(format!("decode: {err}"))
        } else {
            SourceError::Unknown(err.to_string())
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, SourceError> {
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.read_token)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let hint = body.chars().take(200).collect::<String>();
            return Err(Self::classify_status(status, &hint));
        }

        resp.json::<T>().await.map_err(Self::classify_transport)
    }
}

#[async_trait::async_trait]
impl SourceReadClient for HttpSourceClient {
    fn name(&self) -> &'static str {
        "source-http"
    }

    async fn get_event(&self, event_id: &str) -> Result<EventRecord, SourceError> {
        let url = format!("{}/v1/events/{event_id}", self.base_url);
        let envelope: EventEnvelope = self.get_json(url).await?;
        normalize_event(&envelope.event, &self.locations)
    }

    async fn list_recent_event_ids(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/v1/events?updated_since={}&limit={limit}",
            self.base_url,
            since.to_rfc3339(),
        );
        let envelope: EventListEnvelope = self.get_json(url).await?;

        let mut ids = Vec::with_capacity(envelope.events.len());
        for wire in &envelope.events {
            let id = wire.id_string();
            if id.is_empty() {
                warn!("source returned an event without an id; skipping");
                continue;
            }
            ids.push(id);
        }
        Ok(ids)
    }
}

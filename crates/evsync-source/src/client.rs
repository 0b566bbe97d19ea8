//! Read-only client contract against the Source platform.

use std::fmt;

use chrono::{DateTime, Utc};
use evsync_schemas::EventRecord;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Closed set of Source read failures.
///
/// `NotFound` and `Unauthorized` are terminal: they are never retried, so a
/// real denial is never masked as a flake. Only `Transient` is retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    NotFound,
    Unauthorized,
    Transient(String),
    Unknown(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }

    /// Stable label for logs and failure notifications.
    pub fn label(&self) -> &'static str {
        match self {
            SourceError::NotFound => "NOT_FOUND",
            SourceError::Unauthorized => "UNAUTHORIZED",
            SourceError::Transient(_) => "TRANSIENT_ERROR",
            SourceError::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound => write!(f, "source: event not found"),
            SourceError::Unauthorized => write!(f, "source: unauthorized"),
            SourceError::Transient(msg) => write!(f, "source transient error: {msg}"),
            SourceError::Unknown(msg) => write!(f, "source unknown error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Upstream event-platform read contract.
///
/// Object-safe so callers hold an `Arc<dyn SourceReadClient>` without
/// knowing the concrete type; `Send + Sync` so it crosses task boundaries.
#[async_trait::async_trait]
pub trait SourceReadClient: Send + Sync {
    /// Human-readable name identifying this client (e.g. `"source-http"`).
    fn name(&self) -> &'static str;

    /// Fetch one event's canonical data by id.
    async fn get_event(&self, event_id: &str) -> Result<EventRecord, SourceError>;

    /// Enumerate ids of events updated since `since`, newest first.
    ///
    /// Source cannot filter precisely by modification time, so this degrades
    /// to "most recent `limit` updated events" — an accepted limitation of
    /// the sweep, not a defect.
    async fn list_recent_event_ids(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, SourceError>;
}

//! Wire-shape of a Source event and its normalization to [`EventRecord`].
//!
//! Source event dates are local to the venue; normalization resolves the
//! location's IANA timezone from the directory and converts to UTC. Both
//! the HTTP client and the webhook ingress (inline payload) go through
//! [`normalize_event`], so the two trigger paths cannot diverge.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use evsync_config::LocationDirectory;
use evsync_schemas::{Billing, EventRecord, EventStatus, LineItem};

use crate::SourceError;

/// A Source event as delivered on the wire (API read or webhook payload).
#[derive(Debug, Clone, Deserialize)]
pub struct EventWire {
    /// Source serializes ids as numbers in some payloads and strings in
    /// others; accept both.
    pub id: serde_json::Value,
    pub location_key: String,
    pub status: EventStatus,
    /// Venue-local calendar date, `YYYY-MM-DD`.
    pub event_date: String,
    /// Venue-local start time, `HH:MM` or `HH:MM:SS`. Optional.
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub billing: Option<Billing>,
}

impl EventWire {
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Convert a wire event to the canonical [`EventRecord`].
///
/// Unknown locations still normalize (with a UTC fallback for the
/// timezone): rejection for `UNKNOWN_LOCATION` is the eligibility gate's
/// call, not the parser's.
pub fn normalize_event(
    wire: &EventWire,
    locations: &LocationDirectory,
) -> Result<EventRecord, SourceError> {
    let date = NaiveDate::parse_from_str(&wire.event_date, "%Y-%m-%d")
        .map_err(|e| SourceError::Unknown(format!("bad event_date {:?}: {e}", wire.event_date)))?;

    let time = match &wire.start_time {
        None => midday(),
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map_err(|e| SourceError::Unknown(format!("bad start_time {raw:?}: {e}")))?,
    };
    let local = date.and_time(time);

    let tz = locations
        .resolve(&wire.location_key)
        .and_then(|m| m.tz().ok());

    let scheduled_at = match tz {
        Some(tz) => tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            // DST gap: fall back to interpreting the wall time as UTC.
            .unwrap_or_else(|| Utc.from_utc_datetime(&local)),
        None => Utc.from_utc_datetime(&local),
    };

    Ok(EventRecord {
        id: wire.id_string(),
        location_key: wire.location_key.clone(),
        status: wire.status,
        scheduled_at,
        line_items: wire.line_items.clone(),
        billing: wire.billing,
    })
}

/// Anchor used when Source omits a start time: local midday keeps the event
/// inside symmetric lead/trailing windows on its calendar day.
fn midday() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).expect("static time")
}

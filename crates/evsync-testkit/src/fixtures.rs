//! Shared fixtures: canned events, a two-location directory, and a wired
//! engine over the fakes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use evsync_config::{ConnectorConfig, LocationDirectory, LocationMapping};
use evsync_reconcile::{EligibilityGate, LogNotifier, ReconciliationEngine};
use evsync_schemas::{Billing, EventRecord, EventStatus, LineItem};
use evsync_source::EventFetcher;
use evsync_target::{DedupIndex, OrderInjector};

use crate::{FakeSource, FakeTarget};

/// A definite, fully-paid event scheduled for right now — passes every gate
/// check against the [`test_locations`] directory.
pub fn definite_event(id: &str, location_key: &str) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        location_key: location_key.to_string(),
        status: EventStatus::Definite,
        scheduled_at: Utc::now(),
        line_items: vec![
            LineItem {
                name: "Banquet package".to_string(),
                quantity: 2,
            },
            LineItem {
                name: "Open bar".to_string(),
                quantity: 1,
            },
        ],
        billing: Some(Billing {
            subtotal_cents: 250_00,
            invoice_total_cents: 200_00,
            paid_cents: 200_00,
            closed: true,
        }),
    }
}

/// Two locations: `loc-1` → establishment 4, `loc-2` → establishment 7.
pub fn test_locations() -> Arc<LocationDirectory> {
    let catalog: BTreeMap<String, i64> = [
        ("Banquet package".to_string(), 101),
        ("Open bar".to_string(), 102),
    ]
    .into_iter()
    .collect();

    let mut entries = BTreeMap::new();
    entries.insert(
        "loc-1".to_string(),
        LocationMapping {
            establishment: "4".to_string(),
            dining_option_id: 1,
            payment_type_id: 3,
            discount_id: 9,
            timezone: "America/New_York".to_string(),
            catalog: catalog.clone(),
        },
    );
    entries.insert(
        "loc-2".to_string(),
        LocationMapping {
            establishment: "7".to_string(),
            dining_option_id: 1,
            payment_type_id: 3,
            discount_id: 9,
            timezone: "America/Chicago".to_string(),
            catalog,
        },
    );
    Arc::new(LocationDirectory::from_entries(entries))
}

pub fn test_config() -> ConnectorConfig {
    ConnectorConfig::default()
}

/// A fully wired engine plus handles to its fakes for assertions.
pub struct EngineHandle {
    pub engine: Arc<ReconciliationEngine>,
    pub source: Arc<FakeSource>,
    pub target: Arc<FakeTarget>,
    pub locations: Arc<LocationDirectory>,
}

/// Wire an engine over fresh fakes.
///
/// The dedup fast-path TTL is short so scenarios probing Target-side truth
/// are not masked by caching.
pub fn build_engine(config: &ConnectorConfig, dry_run: bool) -> EngineHandle {
    let source = Arc::new(FakeSource::new());
    let target = Arc::new(FakeTarget::new());
    let locations = test_locations();

    let dedup = Arc::new(DedupIndex::new(
        target.clone(),
        Duration::from_secs(60),
    ));
    let engine = Arc::new(ReconciliationEngine::new(
        EventFetcher::new(source.clone()),
        EligibilityGate::from_config(config, locations.clone()),
        dedup.clone(),
        OrderInjector::new(target.clone(), dedup),
        locations.clone(),
        Arc::new(LogNotifier),
        config.source_name.clone(),
        dry_run,
    ));

    EngineHandle {
        engine,
        source,
        target,
        locations,
    }
}

//! Deterministic in-memory stand-ins for the Source and Target boundaries.
//!
//! `FakeTarget` enforces external-ref uniqueness atomically under one lock,
//! the same contract a real POS backend provides, which makes the
//! at-most-once race scenarios deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use evsync_schemas::EventRecord;
use evsync_source::{SourceError, SourceReadClient};
use evsync_target::{OrderSpec, TargetClient, TargetError};

// ---------------------------------------------------------------------------
// FakeSource
// ---------------------------------------------------------------------------

/// In-memory Source: a map of events plus optional scripted failures.
///
/// Scripted failures are consumed front-to-back, one per `get_event` call
/// for the matching id, before the stored event is served. This models a
/// flaky upstream precisely enough to test the single-retry policy.
pub struct FakeSource {
    events: Mutex<HashMap<String, EventRecord>>,
    scripted_failures: Mutex<HashMap<String, Vec<SourceError>>>,
    recent_ids: Mutex<Vec<String>>,
    /// Artificial per-read latency, for timeout scenarios.
    read_delay: Mutex<Option<std::time::Duration>>,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            scripted_failures: Mutex::new(HashMap::new()),
            recent_ids: Mutex::new(Vec::new()),
            read_delay: Mutex::new(None),
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every subsequent `get_event` by `delay`.
    pub fn set_read_delay(&self, delay: std::time::Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn insert_event(&self, event: EventRecord) {
        let mut recent = self.recent_ids.lock().unwrap();
        if !recent.contains(&event.id) {
            recent.push(event.id.clone());
        }
        self.events.lock().unwrap().insert(event.id.clone(), event);
    }

    /// Queue failures for `event_id`; each `get_event` consumes one until
    /// the queue drains, then the stored event (or NotFound) is served.
    pub fn script_failures(&self, event_id: &str, failures: Vec<SourceError>) {
        self.scripted_failures
            .lock()
            .unwrap()
            .insert(event_id.to_string(), failures);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SourceReadClient for FakeSource {
    fn name(&self) -> &'static str {
        "fake-source"
    }

    async fn get_event(&self, event_id: &str) -> Result<EventRecord, SourceError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut scripted = self.scripted_failures.lock().unwrap();
        if let Some(queue) = scripted.get_mut(event_id) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        drop(scripted);

        self.events
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or(SourceError::NotFound)
    }

    async fn list_recent_event_ids(
        &self,
        _since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let recent = self.recent_ids.lock().unwrap();
        Ok(recent.iter().take(limit).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// FakeTarget
// ---------------------------------------------------------------------------

/// In-memory POS backend with an atomic external-ref uniqueness check.
///
/// `create_order` holds one lock across check-and-insert, so of N racing
/// creates for the same ref exactly one wins and the rest get a 409 — the
/// same behavior the at-most-once guarantee leans on downstream.
pub struct FakeTarget {
    orders: Mutex<HashMap<String, String>>,
    fail_create_refs: Mutex<HashMap<String, TargetError>>,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl Default for FakeTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTarget {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            fail_create_refs: Mutex::new(HashMap::new()),
            find_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    /// Make `create_order` fail with `error` whenever the submitted order
    /// carries this external ref. The failure is sticky.
    pub fn fail_create_for(&self, external_ref: &str, error: TargetError) {
        self.fail_create_refs
            .lock()
            .unwrap()
            .insert(external_ref.to_string(), error);
    }

    /// Pre-seed an existing order, as if a previous run injected it.
    pub fn seed_order(&self, external_ref: &str, order_ref: &str) {
        self.orders
            .lock()
            .unwrap()
            .insert(external_ref.to_string(), order_ref.to_string());
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn order_ref_for(&self, external_ref: &str) -> Option<String> {
        self.orders.lock().unwrap().get(external_ref).cloned()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TargetClient for FakeTarget {
    fn name(&self) -> &'static str {
        "fake-target"
    }

    async fn find_by_external_ref(
        &self,
        _establishment: &str,
        external_ref: &str,
    ) -> Result<bool, TargetError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().unwrap().contains_key(external_ref))
    }

    async fn create_order(&self, spec: &OrderSpec) -> Result<String, TargetError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.fail_create_refs.lock().unwrap().get(&spec.external_ref) {
            return Err(err.clone());
        }

        let mut orders = self.orders.lock().unwrap();
        if orders.contains_key(&spec.external_ref) {
            return Err(TargetError::Api {
                status: 409,
                message: "duplicate external reference".to_string(),
            });
        }
        let order_ref = format!("ord-{}", orders.len() + 1);
        orders.insert(spec.external_ref.clone(), order_ref.clone());
        Ok(order_ref)
    }
}

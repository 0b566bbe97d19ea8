//! Authoritative duplicate index with an in-memory fast path.
//!
//! Target is the sole authority on "already processed": nothing here
//! survives a restart, and losing the fast-path cache degrades performance,
//! never correctness. The cache only holds **positive** facts (key is known
//! to exist) so a stale entry can never suppress a legitimate injection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{TargetClient, TargetError};

pub struct DedupIndex {
    client: Arc<dyn TargetClient>,
    /// dedup key → when we learned it exists in Target.
    fast_path: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl DedupIndex {
    pub fn new(client: Arc<dyn TargetClient>, ttl: Duration) -> Self {
        Self {
            client,
            fast_path: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Whether an order tagged `dedup_key` exists at the establishment.
    ///
    /// Consults the fast path first to avoid hammering Target when the
    /// webhook path and the sweep race on the same key; a miss always falls
    /// through to the authoritative query.
    pub async fn exists(
        &self,
        establishment: &str,
        dedup_key: &str,
    ) -> Result<bool, TargetError> {
        if self.fast_path_hit(dedup_key) {
            debug!(dedup_key, "dedup fast-path hit");
            return Ok(true);
        }

        let exists = self
            .client
            .find_by_external_ref(establishment, dedup_key)
            .await?;
        if exists {
            self.note_exists(dedup_key);
        }
        Ok(exists)
    }

    /// Record a key as known-existing (called after a successful injection).
    pub fn note_exists(&self, dedup_key: &str) {
        let mut map = self.fast_path.lock().expect("dedup fast-path poisoned");
        let now = Instant::now();
        map.retain(|_, seen| now.duration_since(*seen) < self.ttl);
        map.insert(dedup_key.to_string(), now);
    }

    fn fast_path_hit(&self, dedup_key: &str) -> bool {
        let map = self.fast_path.lock().expect("dedup fast-path poisoned");
        map.get(dedup_key)
            .is_some_and(|seen| seen.elapsed() < self.ttl)
    }
}

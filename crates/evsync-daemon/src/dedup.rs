//! Webhook delivery dedup fast path.
//!
//! Bounded, time-evicting map of delivery keys. Purely a performance layer
//! in front of the authoritative duplicate index: losing every entry here
//! (restart, eviction) costs one redundant engine invocation per replay,
//! never a duplicate order.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_CAP: usize = 4096;

/// Key identifying one exact webhook delivery.
pub fn delivery_key(location_key: &str, event_id: &str, delivery_ts: &str) -> String {
    format!("{location_key}:{event_id}:{delivery_ts}")
}

pub struct DeliveryDedup {
    seen: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
    cap: usize,
}

impl Default for DeliveryDedup {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAP)
    }
}

impl DeliveryDedup {
    pub fn new(ttl: Duration, cap: usize) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            ttl,
            cap,
        }
    }

    /// Record `key`; returns true if this is its first appearance within
    /// the TTL window.
    pub fn first_seen(&self, key: &str) -> bool {
        let mut map = self.seen.lock().expect("delivery dedup poisoned");
        let now = Instant::now();
        map.retain(|_, at| now.duration_since(*at) < self.ttl);

        if map.contains_key(key) {
            return false;
        }
        // At capacity after expiry purge: drop the oldest entry. Evicting a
        // live entry is safe, it only re-opens the fast path.
        if map.len() >= self.cap {
            if let Some(oldest) = map
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(k, _)| k.clone())
            {
                map.remove(&oldest);
            }
        }
        map.insert(key.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delivery_passes_replay_blocks() {
        let dedup = DeliveryDedup::default();
        let key = delivery_key("loc-1", "E1", "1767225600");
        assert!(dedup.first_seen(&key));
        assert!(!dedup.first_seen(&key));
    }

    #[test]
    fn distinct_delivery_timestamps_are_distinct_deliveries() {
        let dedup = DeliveryDedup::default();
        assert!(dedup.first_seen(&delivery_key("loc-1", "E1", "100")));
        assert!(dedup.first_seen(&delivery_key("loc-1", "E1", "200")));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let dedup = DeliveryDedup::new(Duration::from_millis(10), 16);
        let key = delivery_key("loc-1", "E1", "100");
        assert!(dedup.first_seen(&key));
        std::thread::sleep(Duration::from_millis(25));
        assert!(dedup.first_seen(&key), "expired entry reopens the fast path");
    }

    #[test]
    fn capacity_is_bounded() {
        let dedup = DeliveryDedup::new(Duration::from_secs(60), 8);
        for i in 0..64 {
            assert!(dedup.first_seen(&delivery_key("loc-1", &format!("E{i}"), "100")));
        }
        let map = dedup.seen.lock().unwrap();
        assert!(map.len() <= 8);
    }
}

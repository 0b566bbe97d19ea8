//! evsync-config
//!
//! Configuration for the connector: env-driven settings plus a JSON
//! location directory mapping Source location keys to Target destinations.
//!
//! Everything loaded here is read once at process start and treated as
//! immutable for the remainder of the process; callers hold the result in
//! an `Arc` and "reload" means replacing the snapshot, never mutating it.

mod locations;

pub use locations::{LocationDirectory, LocationMapping};

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Known secret-like prefixes. If any leaf string in the location directory
/// starts with one of these, loading aborts with CONFIG_SECRET_DETECTED.
/// Credentials belong in env vars, never in config files.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // Stripe / OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "xoxb-",      // Slack bot token
];

// ---------------------------------------------------------------------------
// ConnectorConfig
// ---------------------------------------------------------------------------

/// Immutable process-wide settings snapshot.
///
/// `kill_switch` here is only the **boot** value; the daemon copies it into
/// an atomic flag so flips take effect without rebuilding the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Short Source name used as the dedup-key prefix (e.g. `"ts"`).
    pub source_name: String,
    /// When true, all ingress paths short-circuit to a no-op ack.
    pub kill_switch: bool,
    /// When true, the full pipeline runs but the final Target write is
    /// suppressed.
    pub dry_run: bool,
    /// `None` = all locations allowed; otherwise an explicit allowlist.
    pub allowed_locations: Option<BTreeSet<String>>,
    /// How far before `scheduled_at` an event may be injected.
    pub lead_window_hours: i64,
    /// How far after `scheduled_at` an event may still be injected.
    pub trailing_window_hours: i64,
    /// Past the trailing window, events are deferred for this long before
    /// being rejected outright.
    pub grace_window_hours: i64,
    /// Sweep interval for the background scheduler.
    pub sync_interval_minutes: u64,
    /// Default lookback for sweep enumeration.
    pub lookback_hours: i64,
    /// Bound on one webhook-path engine invocation.
    pub webhook_timeout_secs: u64,
    /// Bound on one whole sweep run.
    pub batch_timeout_secs: u64,
    /// Per-event bound inside a sweep.
    pub event_timeout_secs: u64,
    /// Worker bound for sweep concurrency.
    pub batch_concurrency: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            source_name: "ts".to_string(),
            kill_switch: false,
            dry_run: false,
            allowed_locations: None,
            lead_window_hours: 24,
            trailing_window_hours: 24,
            grace_window_hours: 24,
            sync_interval_minutes: 45,
            lookback_hours: 48,
            webhook_timeout_secs: 30,
            batch_timeout_secs: 120,
            event_timeout_secs: 30,
            batch_concurrency: 4,
        }
    }
}

impl ConnectorConfig {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// Variables: `EVSYNC_SOURCE_NAME`, `EVSYNC_KILL_SWITCH`,
    /// `EVSYNC_DRY_RUN`, `EVSYNC_ALLOWED_LOCATIONS` (comma-separated),
    /// `EVSYNC_LEAD_WINDOW_HOURS`, `EVSYNC_TRAILING_WINDOW_HOURS`,
    /// `EVSYNC_GRACE_WINDOW_HOURS`, `EVSYNC_SYNC_INTERVAL_MINUTES`,
    /// `EVSYNC_LOOKBACK_HOURS`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("EVSYNC_SOURCE_NAME") {
            if !v.trim().is_empty() {
                cfg.source_name = v.trim().to_string();
            }
        }
        cfg.kill_switch = env_bool("EVSYNC_KILL_SWITCH").unwrap_or(cfg.kill_switch);
        cfg.dry_run = env_bool("EVSYNC_DRY_RUN").unwrap_or(cfg.dry_run);

        if let Ok(v) = std::env::var("EVSYNC_ALLOWED_LOCATIONS") {
            let set: BTreeSet<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !set.is_empty() {
                cfg.allowed_locations = Some(set);
            }
        }

        cfg.lead_window_hours = env_i64("EVSYNC_LEAD_WINDOW_HOURS")?.unwrap_or(cfg.lead_window_hours);
        cfg.trailing_window_hours =
            env_i64("EVSYNC_TRAILING_WINDOW_HOURS")?.unwrap_or(cfg.trailing_window_hours);
        cfg.grace_window_hours =
            env_i64("EVSYNC_GRACE_WINDOW_HOURS")?.unwrap_or(cfg.grace_window_hours);
        cfg.sync_interval_minutes = env_i64("EVSYNC_SYNC_INTERVAL_MINUTES")?
            .map(|v| v.max(1) as u64)
            .unwrap_or(cfg.sync_interval_minutes);
        cfg.lookback_hours = env_i64("EVSYNC_LOOKBACK_HOURS")?.unwrap_or(cfg.lookback_hours);

        Ok(cfg)
    }

    /// Whether `location_key` passes the allowlist (absent list = allow all).
    pub fn location_allowed(&self, location_key: &str) -> bool {
        match &self.allowed_locations {
            None => true,
            Some(set) => set.contains(location_key),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_minutes * 60)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn event_timeout(&self) -> Duration {
        Duration::from_secs(self.event_timeout_secs)
    }

    /// Stable hash of the effective settings, logged at boot so deployments
    /// can be compared without dumping the config itself.
    pub fn config_hash(&self) -> Result<String> {
        let v = serde_json::to_value(self).context("config serialize failed")?;
        let canonical = serde_json::to_string(&v).context("canonical json serialize failed")?;
        Ok(sha256_hex(canonical.as_bytes()))
    }
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn env_i64(key: &str) -> Result<Option<i64>> {
    match std::env::var(key) {
        Err(_) => Ok(None),
        Ok(v) => {
            let parsed = v
                .trim()
                .parse::<i64>()
                .with_context(|| format!("{key} must be an integer, got {v:?}"))?;
            Ok(Some(parsed))
        }
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Secret-literal guard
// ---------------------------------------------------------------------------

/// Reject config JSON containing secret-looking leaf strings.
pub(crate) fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut stack = vec![(String::new(), v)];
    while let Some((path, node)) = stack.pop() {
        match node {
            Value::Object(map) => {
                for (k, vv) in map {
                    stack.push((format!("{path}/{k}"), vv));
                }
            }
            Value::Array(arr) => {
                for (i, vv) in arr.iter().enumerate() {
                    stack.push((format!("{path}/{i}"), vv));
                }
            }
            Value::String(s) => {
                if looks_like_secret(s) {
                    anyhow::bail!("CONFIG_SECRET_DETECTED leaf={path} value=REDACTED");
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let cfg = ConnectorConfig::default();
        assert!(!cfg.kill_switch);
        assert!(!cfg.dry_run);
        assert!(cfg.allowed_locations.is_none());
        assert_eq!(cfg.sync_interval_minutes, 45);
        assert!(cfg.location_allowed("anything"));
    }

    #[test]
    fn allowlist_restricts_locations() {
        let cfg = ConnectorConfig {
            allowed_locations: Some(["loc-1".to_string()].into_iter().collect()),
            ..ConnectorConfig::default()
        };
        assert!(cfg.location_allowed("loc-1"));
        assert!(!cfg.location_allowed("loc-2"));
    }

    #[test]
    fn config_hash_is_stable_for_equal_configs() {
        let a = ConnectorConfig::default().config_hash().unwrap();
        let b = ConnectorConfig::default().config_hash().unwrap();
        assert_eq!(a, b);

        let c = ConnectorConfig {
            dry_run: true,
            ..ConnectorConfig::default()
        }
        .config_hash()
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn secret_literal_is_rejected() {
        let v = serde_json::json!({
            "loc-1": { "establishment": "4", "api_key": "sk_live_abcdef123456" }
        });
        let err = enforce_no_secret_literals(&v).unwrap_err();
        assert!(err.to_string().contains("CONFIG_SECRET_DETECTED"));
        // The secret value itself must not appear in the error.
        assert!(!err.to_string().contains("abcdef123456"));
    }

    #[test]
    fn short_or_plain_strings_pass_the_guard() {
        let v = serde_json::json!({ "loc-1": { "establishment": "4", "tz": "UTC" } });
        assert!(enforce_no_secret_literals(&v).is_ok());
    }
}

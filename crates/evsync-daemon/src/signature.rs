//! Webhook signature verification.
//!
//! Header format: `t=<unix_ts>,v1=<hex_hmac>`, where the MAC is
//! HMAC-SHA256 over `"{t}.{raw_body}"` with the shared webhook secret.
//! Comparison is constant-time via the `hmac` crate's `verify_slice`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify `header` against `raw_body`. Any malformation — missing parts,
/// non-hex digest, wrong MAC — is the same failure; callers never learn
/// which check tripped.
pub fn verify(secret: &str, header: &str, raw_body: &[u8]) -> bool {
    let Some((timestamp, hex_mac)) = parse_header(header) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_mac) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Produce a valid header for `raw_body`; used by the scenario tests and
/// by operators crafting replay requests.
pub fn sign(secret: &str, timestamp: &str, raw_body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn parse_header(header: &str) -> Option<(&str, &str)> {
    let mut timestamp = None;
    let mut mac = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => mac = Some(v),
            _ => {}
        }
    }
    Some((timestamp?, mac?))
}

//! evsync-source
//!
//! Source-side boundary: the read-only client contract against the upstream
//! event platform, its closed failure taxonomy, the HTTP implementation,
//! and the payload-first `EventFetcher`.
//!
//! Hard rule: everything in this crate uses a **read-scoped** credential.
//! The write-capable Target credential never appears here.

mod client;
mod fetcher;
mod http;
mod wire;

pub use client::{SourceError, SourceReadClient};
pub use fetcher::EventFetcher;
pub use http::HttpSourceClient;
pub use wire::{normalize_event, EventWire};

//! evsync-target
//!
//! Target-side boundary: the POS client contract, the authoritative
//! duplicate index, catalog name matching, and the order injector — the
//! single place where orders are written into Target.

mod catalog;
mod client;
mod dedup;
mod http;
mod injector;

pub use catalog::{match_line_items, normalize_name, CatalogMatch};
pub use client::{Discount, OrderItem, OrderSpec, Payment, TargetClient, TargetError};
pub use dedup::DedupIndex;
pub use http::HttpTargetClient;
pub use injector::{InjectionOutcome, OrderInjector};

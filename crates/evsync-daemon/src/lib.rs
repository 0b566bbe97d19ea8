//! evsync-daemon library target.
//!
//! Exposes the router, state, and ingress pieces for integration tests.
//! The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod dedup;
pub mod ingress;
pub mod routes;
pub mod scheduler;
pub mod signature;
pub mod state;

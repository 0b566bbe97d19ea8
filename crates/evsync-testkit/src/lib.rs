//! evsync-testkit
//!
//! In-memory fakes and fixtures shared by the scenario tests. Nothing here
//! ships in a production build: the daemon and the libraries depend on this
//! crate only from `[dev-dependencies]`.

mod fakes;
mod fixtures;

pub use fakes::{FakeSource, FakeTarget};
pub use fixtures::{
    build_engine, definite_event, test_config, test_locations, EngineHandle,
};

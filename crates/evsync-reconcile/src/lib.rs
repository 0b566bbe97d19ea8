//! evsync-reconcile
//!
//! The reconciliation core: eligibility gating, the per-event engine state
//! machine, and the batch sweep. Both ingress paths (webhook and scheduled
//! sweep) converge here — this crate is the sole writer path into Target,
//! so the at-most-once guarantee has exactly one place to hold.

mod batch;
mod engine;
mod gate;
mod notify;

pub use batch::BatchReconciler;
pub use engine::ReconciliationEngine;
pub use gate::EligibilityGate;
pub use notify::{LogNotifier, NotificationSink};

//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! timer tick (every interval_secs)
//!     → drain template change notifications (forget those fingerprints)
//!     → registry lookup            error → log, pass ends, retry next tick
//!     → group + prune vanished services
//!     → per service (sorted):
//!         fingerprint == committed → "unchanged", skip
//!         otherwise → render       ok → dirty, candidate fingerprint
//!                                  error → log, state untouched
//!     → any dirty? → reload        ok → commit all candidates
//!                                  error → commit nothing
//! ```
//!
//! # Design Decisions
//! - One worker, strictly sequential passes; the state needs no locks
//! - Commits are deferred until the whole batch reloaded, so a rejected
//!   config is retried instead of forgotten
//! - No backoff: a failed pass is simply retried at the next tick

pub mod pass;
pub mod state;
pub mod worker;

pub use pass::{PassOutcome, PassReport};
pub use state::FingerprintStore;
pub use worker::Reconciler;

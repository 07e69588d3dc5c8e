//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → registry client + renderer + reload invoker
//!     → template watcher, diagnostics endpoint
//!     → reconciler loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → reconciler and diagnostics stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, RunError, RunMode};

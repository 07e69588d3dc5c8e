//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Reconciler, registry, renderer, reload invoker produce:
//!     → logging.rs (structured tracing events, one span per pass)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (JSON when not attached to a terminal)
//!     → diagnostics endpoint `/metrics` (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

//! Upstream visor: keeps nginx upstream configs in sync with a service registry.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────┐  lookup   ┌──────────┐  groups   ┌──────────────┐
//!   │ registry │──────────▶│ upstream │──────────▶│  reconciler  │
//!   │ (consul) │           │ grouping │           │ fingerprints │
//!   └──────────┘           └──────────┘           └──────┬───────┘
//!                                                        │ changed services
//!                                                        ▼
//!                          ┌──────────┐  dirty    ┌──────────────┐
//!                          │  reload  │◀──────────│    render    │
//!                          │ test+cmd │           │ <svc>.conf   │
//!                          └──────────┘           └──────────────┘
//!
//!   Cross-cutting: config, observability, lifecycle, admin (diagnostics)
//! ```

// Core pipeline
pub mod reconciler;
pub mod registry;
pub mod reload;
pub mod render;
pub mod upstream;

// Cross-cutting concerns
pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::VisorConfig;
pub use lifecycle::Shutdown;
pub use reconciler::Reconciler;

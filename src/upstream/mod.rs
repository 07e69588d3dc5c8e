//! Upstream modelling subsystem.
//!
//! # Data Flow
//! ```text
//! Registry snapshot (Vec<RegistryEntry>)
//!     → group.rs (partition by service name, keep discovery order)
//!         → instance.rs (weight from tags, backup from health)
//!         → single-instance backup override
//!     → fingerprint.rs (sorted canonical join per group)
//!     → compared against the reconciler's committed fingerprints
//! ```
//!
//! # Design Decisions
//! - Groups are rebuilt from scratch on every pass; nothing here is persisted
//! - Groups iterate in service name order so logs and passes are deterministic
//! - Fingerprints are plain strings; readable in debug logs

pub mod fingerprint;
pub mod group;
pub mod instance;

pub use fingerprint::Fingerprint;
pub use group::ServiceGroups;
pub use instance::Instance;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overlay (loader.rs, empty values ignored)
//!     → validation.rs (semantic checks)
//!     → VisorConfig (validated, immutable)
//!     → passed by value / Arc to every component
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the daemon runs with no configuration at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, LoadedConfig};
pub use schema::{
    ObservabilityConfig, PathsConfig, ReconcileConfig, RegistryConfig, ReloadConfig, VisorConfig,
};

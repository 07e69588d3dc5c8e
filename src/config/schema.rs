//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the visor.
//! All types derive Serde traits so a TOML file can override the defaults
//! before the environment overlay is applied.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the visor daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct VisorConfig {
    /// Service discovery registry connection.
    pub registry: RegistryConfig,

    /// Template and generated configuration locations.
    pub paths: PathsConfig,

    /// Load balancer test/reload commands.
    pub reload: ReloadConfig,

    /// Reconciliation loop settings.
    pub reconcile: ReconcileConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Registry connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry DSN, e.g. `http://127.0.0.1:8500?dc=dc1&refresh_interval=5`.
    pub dsn: String,

    /// HTTP request timeout in seconds for a single registry call.
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            dsn: "http://127.0.0.1:8500?dc=dc1&refresh_interval=5".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<service>.tpl` templates.
    pub templates_dir: PathBuf,

    /// Directory receiving `<service>.conf` files.
    pub conf_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("/etc/nginx-visor/templates/"),
            conf_dir: PathBuf::from("/etc/nginx/conf.d/"),
        }
    }
}

/// External command lines run after configs change.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReloadConfig {
    /// Validates the generated configuration (e.g. `nginx -t`).
    pub test_cmd: String,

    /// Tells the load balancer to pick up the new configuration.
    pub reload_cmd: String,

    /// Upper bound for each command, in seconds.
    pub command_timeout_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            test_cmd: "/usr/local/sbin/nginx -t".to_string(),
            reload_cmd: "service nginx reload".to_string(),
            command_timeout_secs: 30,
        }
    }
}

impl ReloadConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Pass interval in seconds.
    pub interval_secs: u64,

    /// Forget fingerprints of services missing from the latest snapshot.
    pub prune_vanished: bool,

    /// Re-render a service when its template file changes on disk.
    pub watch_templates: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            prune_vanished: true,
            watch_templates: true,
        }
    }
}

impl ReconcileConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostics endpoint bind address. `None` disables the endpoint
    /// unless the log level is `debug` or `trace`.
    pub diagnostics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            diagnostics_address: None,
        }
    }
}

/// Address used when debug logging switches the diagnostics endpoint on.
pub const DEFAULT_DIAGNOSTICS_ADDRESS: &str = "127.0.0.1:6060";

impl ObservabilityConfig {
    /// Resolve where the diagnostics endpoint should listen, if anywhere.
    pub fn diagnostics_addr(&self) -> Option<Result<SocketAddr, std::net::AddrParseError>> {
        match &self.diagnostics_address {
            Some(addr) => Some(addr.parse()),
            None if self.is_verbose() => Some(DEFAULT_DIAGNOSTICS_ADDRESS.parse()),
            None => None,
        }
    }

    fn is_verbose(&self) -> bool {
        matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "debug" | "trace"
        )
    }
}

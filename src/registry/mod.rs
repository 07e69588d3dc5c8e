//! Service discovery registry client.
//!
//! # Data Flow
//! ```text
//! Reconciler tick
//!     → Registry::lookup() (full snapshot, no filter)
//!         → consul.rs: catalog services → health entries per service
//!         → snapshot cache (reused within refresh_interval)
//!     → Vec<RegistryEntry> handed to the grouper
//! ```
//!
//! # Design Decisions
//! - One trait seam so the reconciler can be driven by an in-memory registry in tests
//! - A lookup either returns the whole snapshot or fails as a whole
//! - Health is aggregated per entry; the grouper only cares whether it is passing

pub mod consul;
pub mod dsn;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use consul::ConsulRegistry;
pub use dsn::RegistryDsn;

/// Aggregated health of one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Passing,
    Warning,
    Critical,
    Maintenance,
}

impl HealthStatus {
    pub fn is_passing(self) -> bool {
        self == HealthStatus::Passing
    }

    /// Parse a Consul check status. Unknown values count as critical.
    pub fn from_check(status: &str) -> Self {
        match status {
            "passing" => HealthStatus::Passing,
            "warning" => HealthStatus::Warning,
            "maintenance" => HealthStatus::Maintenance,
            _ => HealthStatus::Critical,
        }
    }

    /// Combine check statuses: any critical or maintenance check wins, then
    /// any warning, otherwise passing. No checks at all means passing.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        let mut result = HealthStatus::Passing;
        for status in statuses {
            match status {
                HealthStatus::Critical | HealthStatus::Maintenance => return HealthStatus::Critical,
                HealthStatus::Warning => result = HealthStatus::Warning,
                HealthStatus::Passing => {}
            }
        }
        result
    }
}

/// One service instance as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub status: HealthStatus,
    pub tags: Vec<String>,
}

impl RegistryEntry {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            status: HealthStatus::Passing,
            tags: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: HealthStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Errors that can occur while talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The DSN could not be understood.
    #[error("invalid registry DSN {dsn:?}: {reason}")]
    InvalidDsn { dsn: String, reason: String },

    /// Connection, timeout or body decoding failure.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// A source of full registry snapshots.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Return every known instance of every service.
    async fn lookup(&self) -> Result<Vec<RegistryEntry>, RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_aggregation() {
        use HealthStatus::*;
        assert_eq!(HealthStatus::aggregate(Vec::<HealthStatus>::new()), Passing);
        assert_eq!(HealthStatus::aggregate([Passing, Passing]), Passing);
        assert_eq!(HealthStatus::aggregate([Passing, Warning]), Warning);
        assert_eq!(HealthStatus::aggregate([Warning, Maintenance, Passing]), Critical);
        assert_eq!(HealthStatus::from_check("bogus"), Critical);
    }
}

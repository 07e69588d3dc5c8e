//! Upstream instance abstraction.
//!
//! # Responsibilities
//! - Represent a single load balancer upstream server
//! - Derive weight from `SERVICE_WEIGHT=<n>` registry tags
//! - Derive the backup flag from registry health

use std::fmt;

use serde::Serialize;

use crate::registry::RegistryEntry;

/// Tag prefix overriding the default weight.
pub const WEIGHT_TAG_PREFIX: &str = "SERVICE_WEIGHT=";

/// Weight used when no valid weight tag is present.
pub const DEFAULT_WEIGHT: u32 = 1;

/// A single upstream server as seen by templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub host: String,
    pub port: u16,
    pub weight: u32,
    /// Failover-only server.
    pub backup: bool,
}

impl Instance {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            weight: DEFAULT_WEIGHT,
            backup: false,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }
}

impl From<&RegistryEntry> for Instance {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            host: entry.address.clone(),
            port: entry.port,
            weight: weight_from_tags(&entry.tags),
            backup: !entry.status.is_passing(),
        }
    }
}

/// Canonical form used for fingerprinting: `<host>:<port>?w=<weight>&b=<backup>`.
impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}?w={}&b={}",
            self.host, self.port, self.weight, self.backup
        )
    }
}

/// Scan tags for `SERVICE_WEIGHT=<n>`. The last positive value wins; zero,
/// negative and non-numeric values are ignored.
pub fn weight_from_tags<S: AsRef<str>>(tags: &[S]) -> u32 {
    tags.iter()
        .filter_map(|tag| tag.as_ref().strip_prefix(WEIGHT_TAG_PREFIX))
        .filter_map(|value| value.parse::<u32>().ok())
        .filter(|&weight| weight != 0)
        .last()
        .unwrap_or(DEFAULT_WEIGHT)
}

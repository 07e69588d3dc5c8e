//! Service grouping.
//!
//! # Responsibilities
//! - Partition a registry snapshot into per-service instance lists
//! - Preserve discovery order inside each group
//! - Apply the single-instance backup override

use std::collections::BTreeMap;

use crate::registry::RegistryEntry;
use crate::upstream::instance::Instance;

/// Service name → ordered instances. Sorted by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceGroups {
    groups: BTreeMap<String, Vec<Instance>>,
}

impl ServiceGroups {
    /// Build groups from a full registry snapshot.
    pub fn from_entries(entries: &[RegistryEntry]) -> Self {
        let mut groups: BTreeMap<String, Vec<Instance>> = BTreeMap::new();

        for entry in entries {
            let instance = Instance::from(entry);
            if instance.backup {
                tracing::debug!(
                    service = %entry.name,
                    address = %instance.host,
                    port = instance.port,
                    status = ?entry.status,
                    "Backup instance"
                );
            } else {
                tracing::debug!(
                    service = %entry.name,
                    address = %instance.host,
                    port = instance.port,
                    weight = instance.weight,
                    "Instance"
                );
            }
            groups.entry(entry.name.clone()).or_default().push(instance);
        }

        // A lone server is never failover-only.
        for instances in groups.values_mut() {
            if let [only] = instances.as_mut_slice() {
                only.backup = false;
            }
        }

        Self { groups }
    }

    /// Iterate non-empty groups in service name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Instance])> {
        self.groups
            .iter()
            .filter(|(_, instances)| !instances.is_empty())
            .map(|(name, instances)| (name.as_str(), instances.as_slice()))
    }

    pub fn get(&self, service: &str) -> Option<&[Instance]> {
        self.groups.get(service).map(Vec::as_slice)
    }

    pub fn contains(&self, service: &str) -> bool {
        self.groups.contains_key(service)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

//! Committed fingerprint store.
//!
//! # State Transitions
//! ```text
//! absent  → committed: reload after a successful render succeeded
//! committed → committed': same, with a new fingerprint
//! committed → absent: template changed on disk, or service vanished (pruning)
//! ```
//!
//! Owned by the single reconciler worker; no locking.

use std::collections::HashMap;

use crate::upstream::{Fingerprint, ServiceGroups};

#[derive(Debug, Default)]
pub struct FingerprintStore {
    committed: HashMap<String, Fingerprint>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service: &str) -> Option<&Fingerprint> {
        self.committed.get(service)
    }

    /// True when `fingerprint` is what was last committed for `service`.
    pub fn is_current(&self, service: &str, fingerprint: &Fingerprint) -> bool {
        self.get(service) == Some(fingerprint)
    }

    /// Commit a batch of candidates after a successful reload.
    pub fn commit<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = (String, Fingerprint)>,
    {
        self.committed.extend(candidates);
    }

    /// Drop one service so its next pass re-renders. Returns whether it was tracked.
    pub fn forget(&mut self, service: &str) -> bool {
        self.committed.remove(service).is_some()
    }

    /// Drop every service missing from `groups`, returning their names sorted.
    pub fn prune(&mut self, groups: &ServiceGroups) -> Vec<String> {
        let mut vanished: Vec<String> = self
            .committed
            .keys()
            .filter(|service| !groups.contains(service))
            .cloned()
            .collect();
        vanished.sort_unstable();
        for service in &vanished {
            self.committed.remove(service);
        }
        vanished
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

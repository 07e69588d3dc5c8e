//! Order-independent membership fingerprint.
//!
//! The fingerprint is the change-detection key, not a security hash: each
//! instance is rendered in its canonical form, the forms are sorted and then
//! joined with `,`. Two groups share a fingerprint exactly when they hold the
//! same multiset of (host, port, weight, backup).

use std::fmt;

use crate::upstream::instance::Instance;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(instances: &[Instance]) -> Self {
        let mut fields: Vec<String> = instances.iter().map(ToString::to_string).collect();
        fields.sort_unstable();
        Self(fields.join(","))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

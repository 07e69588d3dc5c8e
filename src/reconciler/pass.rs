//! Result of one reconciliation pass.

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Registry lookup failed; nothing was touched.
    LookupFailed,
    /// No service rendered successfully; no reload was attempted.
    NoChanges,
    /// Reload succeeded and candidates were committed.
    Reloaded,
    /// Reload failed; candidates were withheld.
    ReloadFailed,
}

impl PassOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            PassOutcome::LookupFailed => "lookup_failed",
            PassOutcome::NoChanges => "no_changes",
            PassOutcome::Reloaded => "reloaded",
            PassOutcome::ReloadFailed => "reload_failed",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, PassOutcome::LookupFailed | PassOutcome::ReloadFailed)
    }
}

/// Per-service breakdown of a pass, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub outcome: PassOutcome,
    /// Rendered this pass (dirty).
    pub rendered: Vec<String>,
    /// Fingerprint matched the committed one.
    pub unchanged: Vec<String>,
    /// Render failed; committed state left as is.
    pub failed: Vec<String>,
}

impl PassReport {
    pub(crate) fn new(outcome: PassOutcome) -> Self {
        Self {
            outcome,
            rendered: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
        }
    }
}

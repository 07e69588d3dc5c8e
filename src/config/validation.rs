//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and timeouts > 0)
//! - Reject command lines that split into no argv
//! - Check the registry DSN and diagnostics address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: VisorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::VisorConfig;
use crate::registry::dsn::RegistryDsn;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &VisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = RegistryDsn::parse(&config.registry.dsn) {
        errors.push(ValidationError::new("registry.dsn", e.to_string()));
    }
    if config.registry.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "registry.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.reload.test_cmd.split_whitespace().next().is_none() {
        errors.push(ValidationError::new("reload.test_cmd", "command line is empty"));
    }
    if config.reload.reload_cmd.split_whitespace().next().is_none() {
        errors.push(ValidationError::new("reload.reload_cmd", "command line is empty"));
    }
    if config.reload.command_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "reload.command_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.reconcile.interval_secs == 0 {
        errors.push(ValidationError::new(
            "reconcile.interval_secs",
            "must be greater than zero",
        ));
    }

    if let Some(Err(e)) = config.observability.diagnostics_addr() {
        errors.push(ValidationError::new(
            "observability.diagnostics_address",
            e.to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

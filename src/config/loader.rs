//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::VisorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_REGISTRY_DSN: &str = "REGISTRY_DSN";
pub const ENV_TEMPLATES_DIR: &str = "TEMPLATES_DIR";
pub const ENV_CONF_DIR: &str = "NGINX_CONF_DIR";
pub const ENV_RELOAD_CMD: &str = "NGINX_RELOAD_CMD";
pub const ENV_TEST_CMD: &str = "NGINX_TEST_CMD";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_INTERVAL_SECS: &str = "VISOR_INTERVAL_SECS";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "VISOR_COMMAND_TIMEOUT_SECS";
pub const ENV_DIAGNOSTICS_ADDR: &str = "VISOR_DIAGNOSTICS_ADDR";

/// A validated configuration plus the variables that fell back to defaults.
///
/// Logging is not up yet while the configuration loads, so the caller
/// reports `defaulted` once the subscriber is installed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: VisorConfig,
    pub defaulted: Vec<&'static str>,
}

/// Load configuration from an optional TOML file, overlay the process
/// environment and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => VisorConfig::default(),
    };

    let defaulted = apply_env(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(LoadedConfig { config, defaulted })
}

/// Overlay non-empty environment variables onto `config`.
///
/// Returns the names of the variables that were absent or empty.
fn apply_env<F>(config: &mut VisorConfig, env: F) -> Result<Vec<&'static str>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let mut defaulted = Vec::new();

    let mut string_var = |key: &'static str, slot: &mut String| match lookup(key) {
        Some(value) => *slot = value,
        None => defaulted.push(key),
    };
    string_var(ENV_REGISTRY_DSN, &mut config.registry.dsn);
    string_var(ENV_RELOAD_CMD, &mut config.reload.reload_cmd);
    string_var(ENV_TEST_CMD, &mut config.reload.test_cmd);
    string_var(ENV_LOG_LEVEL, &mut config.observability.log_level);

    for (key, slot) in [
        (ENV_TEMPLATES_DIR, &mut config.paths.templates_dir),
        (ENV_CONF_DIR, &mut config.paths.conf_dir),
    ] {
        match lookup(key) {
            Some(value) => *slot = PathBuf::from(value),
            None => defaulted.push(key),
        }
    }

    for (key, slot) in [
        (ENV_INTERVAL_SECS, &mut config.reconcile.interval_secs),
        (ENV_COMMAND_TIMEOUT_SECS, &mut config.reload.command_timeout_secs),
    ] {
        if let Some(value) = lookup(key) {
            *slot = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { var: key, value })?;
        }
    }

    if let Some(addr) = lookup(ENV_DIAGNOSTICS_ADDR) {
        config.observability.diagnostics_address = Some(addr);
    }

    Ok(defaulted)
}

//! Load balancer reload subsystem.
//!
//! # Data Flow
//! ```text
//! Reconciler (≥1 dirty service)
//!     → test command (e.g. `nginx -t`)
//!         non-zero / timeout → abort, nothing committed
//!     → reload command (e.g. `service nginx reload`)
//!         non-zero / timeout → failure, nothing committed
//!     → success → reconciler commits candidate fingerprints
//! ```
//!
//! # Design Decisions
//! - One reload covers every service changed in the pass
//! - No per-service knowledge; this only runs two commands
//! - Every command has a deadline and is killed when it expires
//! - stderr is captured and logged on failure

pub mod command;

use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ReloadConfig;
use crate::reload::command::{CommandFailure, CommandLine};

/// Which of the two commands failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Test,
    Reload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Test => "test",
            Stage::Reload => "reload",
        })
    }
}

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("command line is empty")]
    EmptyCommand,

    #[error("{stage} command `{command}` could not be started: {source}")]
    Spawn {
        stage: Stage,
        command: String,
        source: std::io::Error,
    },

    #[error("{stage} command `{command}` failed ({status}): {stderr}")]
    Failed {
        stage: Stage,
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{stage} command `{command}` timed out after {timeout:?}")]
    TimedOut {
        stage: Stage,
        command: String,
        timeout: Duration,
    },
}

impl ReloadError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ReloadError::EmptyCommand => None,
            ReloadError::Spawn { stage, .. }
            | ReloadError::Failed { stage, .. }
            | ReloadError::TimedOut { stage, .. } => Some(*stage),
        }
    }
}

/// Applies freshly rendered configuration to the load balancer.
#[async_trait]
pub trait Reloader: Send + Sync {
    async fn reload(&self) -> Result<(), ReloadError>;
}

/// Runs the configured test command, then the reload command.
#[derive(Debug, Clone)]
pub struct ReloadInvoker {
    test: CommandLine,
    reload: CommandLine,
    timeout: Duration,
}

impl ReloadInvoker {
    pub fn new(config: &ReloadConfig) -> Result<Self, ReloadError> {
        Ok(Self {
            test: CommandLine::parse(&config.test_cmd)?,
            reload: CommandLine::parse(&config.reload_cmd)?,
            timeout: config.command_timeout(),
        })
    }

    async fn run_stage(&self, stage: Stage, command: &CommandLine) -> Result<(), ReloadError> {
        tracing::debug!(stage = %stage, command = %command, "Running command");

        let output = command.run(self.timeout).await.map_err(|failure| match failure {
            CommandFailure::Spawn(source) => ReloadError::Spawn {
                stage,
                command: command.to_string(),
                source,
            },
            CommandFailure::TimedOut => ReloadError::TimedOut {
                stage,
                command: command.to_string(),
                timeout: self.timeout,
            },
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ReloadError::Failed {
                stage,
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}

#[async_trait]
impl Reloader for ReloadInvoker {
    async fn reload(&self) -> Result<(), ReloadError> {
        tracing::info!("Reloading load balancer");

        if let Err(e) = self.run_stage(Stage::Test, &self.test).await {
            tracing::error!(error = %e, "Test cmd failed");
            return Err(e);
        }
        if let Err(e) = self.run_stage(Stage::Reload, &self.reload).await {
            tracing::error!(error = %e, "Reload cmd failed");
            return Err(e);
        }
        Ok(())
    }
}

//! External command execution.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::reload::ReloadError;

/// A whitespace-split command line: `argv[0]` plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn parse(line: &str) -> Result<Self, ReloadError> {
        let mut fields = line.split_whitespace().map(str::to_owned);
        let program = fields.next().ok_or(ReloadError::EmptyCommand)?;
        Ok(Self {
            program,
            args: fields.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run to completion, capturing stderr.
    ///
    /// The child is killed if it outlives `timeout` or if the returned
    /// future is dropped.
    pub async fn run(&self, timeout: Duration) -> Result<CommandOutput, CommandFailure> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            }),
            Ok(Err(e)) => Err(CommandFailure::Spawn(e)),
            Err(_) => Err(CommandFailure::TimedOut),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A command that ran to completion.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stderr: String,
}

/// A command that did not run to completion.
#[derive(Debug)]
pub enum CommandFailure {
    Spawn(std::io::Error),
    TimedOut,
}

//! Error types for fixture operations.
//!
//! `CommandError` is the one a test usually sees: an invocation ended with an exit code the caller did not
//! expect. The remaining variants of [`FixtureError`] separate misuse (`Destroyed`, `EmptyCommand`), missing
//! infrastructure (`Skip`), and plain OS failures.

use std::fmt;

use thiserror::Error;

/// An invocation finished with an unexpected exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    /// Full command line, program first.
    pub command: Vec<String>,
    /// Exit code; `None` when the process ended without one (killed by a signal).
    pub code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => writeln!(f, "Command '{}' finished with exit code {}", self.command.join(" "), code)?,
            None => writeln!(f, "Command '{}' finished without an exit code", self.command.join(" "))?,
        }
        if let Some(out) = &self.stdout {
            writeln!(f, "## STDOUT ##\n{}", out.trim_end())?;
        }
        if let Some(err) = &self.stderr {
            writeln!(f, "## STDERR ##\n{}", err.trim_end())?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandError {}

/// Errors produced by [`Task`](crate::Task) and the invocation primitive.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Task instance has been destroyed. Create a new instance if you need a new client.")]
    Destroyed,

    /// The test cannot run here because a helper is missing. Not a test failure.
    #[error("skipped: {0}")]
    Skip(String),

    #[error("cannot run an empty command")]
    EmptyCommand,

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no taskd server is bound to this client")]
    NoServer,

    /// Raised by [`TaskdServer`](crate::TaskdServer) implementations, such as when `create_user` cannot register a
    /// user.
    #[error("taskd server error: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixtureError {
    /// Whether this is a soft skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, FixtureError::Skip(_))
    }

    /// Exit code carried by a [`CommandError`], if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            FixtureError::Command(e) => e.code,
            _ => None,
        }
    }
}

/// Result type for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

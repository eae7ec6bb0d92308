//! CLI module for `taskw-sandbox`
//!
//! Runs the taskwarrior client once inside a throwaway fixture, which is handy for reproducing a failing test by
//! hand.
//!
//! ## Commands
//!
//! - `run [OPTIONS] -- ARGS...` - Run the client in a fresh sandbox
//! - `diag` - Print `task diag` from a fresh sandbox
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only `main` exits, after the teardown registry has run.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use taskw_core::parse_credentials;

use crate::error::FixtureError;
use crate::server::{StaticTaskdServer, TaskdServer, TaskdUser};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Conventional "test skipped" status (automake).
    pub const SKIPPED: ExitCode = ExitCode(77);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and returns the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl From<FixtureError> for CliError {
    fn from(err: FixtureError) -> Self {
        let exit_code = if err.is_skip() { ExitCode::SKIPPED } else { ExitCode::FAILURE };
        Self::new(format!("Error: {err}"), exit_code)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = crate::version::TASKW_FIXTURE_VERSION;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run taskwarrior in a disposable, isolated sandbox
#[derive(Parser, Debug)]
#[command(name = "taskw-sandbox")]
#[command(version = VERSION)]
#[command(about = "Run taskwarrior in a disposable, isolated sandbox", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub sandbox: SandboxArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand: which client to run and which server to bind.
#[derive(Args, Debug, Default, Clone)]
pub struct SandboxArgs {
    /// Client binary (default: $TASKW_BIN, then `task` on PATH)
    #[arg(long, value_name = "PATH", global = true)]
    pub taskw: Option<String>,

    /// taskd server address
    #[arg(long = "taskd-address", value_name = "HOST", global = true)]
    pub taskd_address: Option<String>,

    /// taskd server port
    #[arg(long = "taskd-port", value_name = "PORT", global = true)]
    pub taskd_port: Option<u16>,

    /// Directory holding test_client.cert.pem and test_client.key.pem
    #[arg(long = "taskd-certs", value_name = "DIR", global = true)]
    pub taskd_certs: Option<PathBuf>,

    /// CA certificate of the taskd server
    #[arg(long = "taskd-ca", value_name = "FILE", global = true)]
    pub taskd_ca: Option<PathBuf>,

    /// Sync user as org/user/key
    #[arg(long = "taskd-user", value_name = "CREDENTIALS", global = true)]
    pub taskd_user: Option<String>,
}

impl SandboxArgs {
    fn any_taskd(&self) -> bool {
        self.taskd_address.is_some()
            || self.taskd_port.is_some()
            || self.taskd_certs.is_some()
            || self.taskd_ca.is_some()
            || self.taskd_user.is_some()
    }

    /// Server description assembled from the `--taskd-*` flags.
    ///
    /// ## Returns
    /// - `Ok(None)` when no taskd flag was given; an error when only some were.
    pub fn server(&self) -> CliResult<Option<Arc<dyn TaskdServer>>> {
        if !self.any_taskd() {
            return Ok(None);
        }
        let (Some(address), Some(port), Some(certs), Some(ca), Some(user)) = (
            &self.taskd_address,
            self.taskd_port,
            &self.taskd_certs,
            &self.taskd_ca,
            &self.taskd_user,
        ) else {
            return Err(CliError::failure(
                "Error: --taskd-address, --taskd-port, --taskd-certs, --taskd-ca and --taskd-user must be given together",
            ));
        };
        let Some((org, name, key)) = parse_credentials(user) else {
            return Err(CliError::failure(format!(
                "Error: invalid --taskd-user '{user}', expected org/user/key"
            )));
        };
        // The group is not part of the identifier; it only matters for minting users.
        let default_user = TaskdUser::new(name, org, org, key);
        Ok(Some(Arc::new(StaticTaskdServer::new(
            certs.clone(),
            ca.clone(),
            address.clone(),
            port,
            default_user,
        ))))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the client once in a fresh sandbox
    Run {
        /// Expect a non-zero exit code instead of success
        #[arg(long = "expect-failure")]
        expect_failure: bool,
        /// Text fed to the client's stdin
        #[arg(long, value_name = "TEXT")]
        input: Option<String>,
        /// Keep stderr separate from stdout
        #[arg(long = "no-merge")]
        no_merge: bool,
        /// Run under `faketime -f SPEC`
        #[arg(long, value_name = "SPEC")]
        faketime: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Leave the sandbox on disk and print its path
        #[arg(long)]
        keep: bool,
        /// Arguments passed to the client
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print `task diag` from a fresh sandbox
    Diag,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// Returns the process exit code; `main` performs the actual exit so teardown
/// can run first.
pub fn run() -> i32 {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => exit_code.0,
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            e.exit_code.0
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run {
            expect_failure,
            input,
            no_merge,
            faketime,
            json,
            keep,
            args,
        } => commands::run_in_sandbox(
            &cli.sandbox,
            &commands::RunOptions {
                args,
                input,
                expect_failure,
                merge_streams: !no_merge,
                faketime,
                json,
                keep,
            },
        ),
        Command::Diag => commands::diag_in_sandbox(&cli.sandbox),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::PathBuf;

use taskw_core::command::full_command;

use crate::error::FixtureError;
use crate::process::CommandOutput;
use crate::task::Task;

use super::{CliError, CliResult, ExitCode, SandboxArgs};

/// Options for a single sandboxed invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub args: Vec<String>,
    pub input: Option<String>,
    pub expect_failure: bool,
    pub merge_streams: bool,
    pub faketime: Option<String>,
    pub json: bool,
    pub keep: bool,
}

/// Create a fixture from the shared sandbox flags.
fn build_task(sandbox: &SandboxArgs) -> CliResult<Task> {
    let mut builder = Task::builder();
    if let Some(taskw) = &sandbox.taskw {
        builder = builder.taskw(taskw.clone());
    }
    if let Some(server) = sandbox.server()? {
        builder = builder.taskd(server);
    }
    Ok(builder.build()?)
}

/// Exit code to report for an unexpected result.
///
/// A failure expected to succeed keeps the client's own code; anything without a usable code reports `1`.
fn failure_exit_code(code: Option<i32>) -> ExitCode {
    match code {
        Some(code) if code != 0 => ExitCode(code),
        _ => ExitCode::FAILURE,
    }
}

fn print_output(output: &CommandOutput) {
    print!("{}", output.stdout());
    eprint!("{}", output.stderr());
}

fn print_json(command: &[String], output: &CommandOutput) -> CliResult<()> {
    let value = serde_json::json!({
        "command": command,
        "code": output.code,
        "stdout": output.stdout,
        "stderr": output.stderr,
    });
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| CliError::failure(format!("Error encoding result: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Print the outcome of one invocation.
///
/// ## Returns
/// - `ExitCode::SUCCESS` when the exit code was the expected one, otherwise the code to report.
fn report(task: &Task, options: &RunOptions, result: Result<CommandOutput, FixtureError>) -> CliResult<ExitCode> {
    match result {
        Ok(output) => {
            if options.json {
                print_json(&full_command(task.command(), &options.args), &output)?;
            } else {
                print_output(&output);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(FixtureError::Command(e)) => {
            let code = failure_exit_code(e.code);
            let command = e.command.clone();
            let prior = CommandOutput::new(e.code, e.stdout, e.stderr);
            let merged = task.diag(Some(&prior));
            if options.json {
                print_json(&command, &merged)?;
            } else {
                eprintln!("Command '{}' did not end as expected", command.join(" "));
                print_output(&merged);
            }
            Ok(code)
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove the sandbox, or hand it over when `keep` is set.
///
/// ## Returns
/// - The data directory left on disk, if any.
fn finish(task: Task, keep: bool) -> CliResult<Option<PathBuf>> {
    if keep {
        let datadir = task.keep();
        eprintln!("Sandbox kept at {}", datadir.display());
        return Ok(Some(datadir));
    }
    task.destroy()?;
    Ok(None)
}

/// Run the client once in a fresh sandbox.
///
/// On an unexpected exit code, the output is printed together with `task diag`
/// and the client's exit code is returned.
pub fn run_in_sandbox(sandbox: &SandboxArgs, options: &RunOptions) -> CliResult<ExitCode> {
    let mut task = build_task(sandbox)?;
    if let Some(spec) = options.faketime.as_deref() {
        task.faketime(Some(spec))?;
    }

    let input = options.input.as_deref();
    let result = if options.expect_failure {
        task.run_error(&options.args, input, options.merge_streams)
    } else {
        task.run_success(&options.args, input, options.merge_streams)
    };

    let outcome = report(&task, options, result);
    finish(task, options.keep)?;

    let exit_code = outcome?;
    if exit_code == ExitCode::SUCCESS {
        Ok(exit_code)
    } else {
        // Output already printed
        Err(CliError::new("", exit_code))
    }
}

/// Print `task diag` from a fresh sandbox.
pub fn diag_in_sandbox(sandbox: &SandboxArgs) -> CliResult<ExitCode> {
    let task = build_task(sandbox)?;
    let output = task.diag(None);
    print_output(&output);
    task.destroy()?;

    if output.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::new("", failure_exit_code(output.code)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_exit_code() {
        assert_eq!(failure_exit_code(Some(3)), ExitCode(3));
        assert_eq!(failure_exit_code(Some(0)), ExitCode::FAILURE);
        assert_eq!(failure_exit_code(None), ExitCode::FAILURE);
    }

    fn sandbox_task(registry: &std::sync::Arc<crate::TeardownRegistry>) -> Task {
        Task::builder()
            .taskw("/nonexistent/task")
            .registry(std::sync::Arc::clone(registry))
            .build()
            .unwrap()
    }

    #[test]
    fn test_finish_removes_sandbox() {
        let registry = std::sync::Arc::new(crate::TeardownRegistry::new());
        let task = sandbox_task(&registry);
        let datadir = task.datadir().to_path_buf();

        assert_eq!(finish(task, false).unwrap(), None);
        assert!(!datadir.exists());
    }

    #[test]
    fn test_finish_keeps_sandbox() {
        let registry = std::sync::Arc::new(crate::TeardownRegistry::new());
        let task = sandbox_task(&registry);
        let datadir = task.datadir().to_path_buf();

        assert_eq!(finish(task, true).unwrap(), Some(datadir.clone()));
        assert!(registry.run_all().is_empty());
        assert!(datadir.join("test.rc").is_file());

        std::fs::remove_dir_all(&datadir).unwrap();
    }

    #[test]
    fn test_missing_client_is_reported() {
        let sandbox = SandboxArgs {
            taskw: Some("/nonexistent/task".into()),
            ..SandboxArgs::default()
        };
        let options = RunOptions {
            args: vec!["list".into()],
            merge_streams: true,
            ..RunOptions::default()
        };
        let err = run_in_sandbox(&sandbox, &options).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("/nonexistent/task"));
    }
}

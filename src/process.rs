//! Blocking process invocation with captured output.
//!
//! Each call spawns one process, optionally feeds it stdin, and waits for it to exit. There is no timeout and no
//! cancellation. When `merge_streams` is set, stdout and stderr share one pipe so the captured text keeps the
//! order in which the child wrote it.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use crate::error::{CommandError, FixtureError, FixtureResult};

/// Environment handed to a child process. It replaces the ambient environment entirely.
pub type Env = HashMap<OsString, OsString>;

/// Outcome of one invocation: `(exit code, stdout, stderr)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process ended without an exit code (killed by a signal).
    pub code: Option<i32>,
    pub stdout: Option<String>,
    /// `None` when stderr was merged into stdout.
    pub stderr: Option<String>,
}

impl CommandOutput {
    pub fn new(code: Option<i32>, stdout: Option<String>, stderr: Option<String>) -> Self {
        Self { code, stdout, stderr }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Captured stdout, or `""` if none.
    pub fn stdout(&self) -> &str {
        self.stdout.as_deref().unwrap_or("")
    }

    /// Captured stderr, or `""` if none (or merged).
    pub fn stderr(&self) -> &str {
        self.stderr.as_deref().unwrap_or("")
    }

    /// Wrap this output into a [`CommandError`] for `command`.
    pub fn into_error(self, command: Vec<String>) -> CommandError {
        CommandError {
            command,
            code: self.code,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Write `input` to the child's stdin, then close it.
///
/// A child that exits without reading its input is not an error.
fn feed_stdin(stdin: Option<ChildStdin>, input: Option<&str>) -> io::Result<()> {
    let (Some(mut stdin), Some(input)) = (stdin, input) else {
        return Ok(());
    };
    match stdin.write_all(input.as_bytes()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn join_feeder(handle: thread::ScopedJoinHandle<'_, io::Result<()>>) -> io::Result<()> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("stdin writer thread panicked")))
}

/// Run `command` and capture its output without interpreting the exit code.
///
/// ## Parameters
/// - `command`: program followed by its arguments.
/// - `input`: text written to stdin; stdin is closed immediately when `None`.
/// - `merge_streams`: fold stderr into stdout.
/// - `env`: the complete child environment.
///
/// ## Errors
///
/// Only when the process cannot be started or its pipes fail. A non-zero exit is returned as data.
#[tracing::instrument(skip_all, fields(program = command.first().map(String::as_str).unwrap_or(""), merge_streams = merge_streams))]
pub fn run_cmd_wait_nofail(
    command: &[String],
    input: Option<&str>,
    merge_streams: bool,
    env: &Env,
) -> FixtureResult<CommandOutput> {
    let Some((program, args)) = command.split_first() else {
        return Err(FixtureError::EmptyCommand);
    };
    let spawn_error = |source| FixtureError::Spawn {
        program: program.clone(),
        source,
    };

    let output = if merge_streams {
        let (mut reader, writer) = io::pipe()?;
        // The builder owns the write ends; it must be gone before reading or the read never sees EOF.
        let mut child = {
            let mut cmd = Command::new(program);
            cmd.args(args)
                .env_clear()
                .envs(env)
                .stdin(Stdio::piped())
                .stdout(writer.try_clone()?)
                .stderr(writer);
            cmd.spawn().map_err(spawn_error)?
        };
        let stdin = child.stdin.take();
        let mut buf = Vec::new();
        thread::scope(|s| {
            let feeder = s.spawn(move || feed_stdin(stdin, input));
            let read = reader.read_to_end(&mut buf);
            join_feeder(feeder).and(read.map(|_| ()))
        })?;
        let status = child.wait()?;
        CommandOutput::new(status.code(), Some(decode(&buf)), None)
    } else {
        let mut child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;
        let stdin = child.stdin.take();
        let out = thread::scope(|s| {
            let feeder = s.spawn(move || feed_stdin(stdin, input));
            let out = child.wait_with_output();
            join_feeder(feeder).and(out)
        })?;
        CommandOutput::new(out.status.code(), Some(decode(&out.stdout)), Some(decode(&out.stderr)))
    };

    tracing::debug!(command = ?command, code = ?output.code, "invocation finished");
    Ok(output)
}

/// Like [`run_cmd_wait_nofail`], but any exit other than `0` becomes a [`CommandError`].
pub fn run_cmd_wait(command: &[String], input: Option<&str>, merge_streams: bool, env: &Env) -> FixtureResult<CommandOutput> {
    let output = run_cmd_wait_nofail(command, input, merge_streams, env)?;
    if output.success() {
        Ok(output)
    } else {
        Err(output.into_error(command.to_vec()).into())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn ambient() -> Env {
        std::env::vars_os().collect()
    }

    #[test]
    fn test_separate_streams() {
        let out = run_cmd_wait_nofail(&sh("echo out; echo err >&2; exit 3"), None, false, &ambient()).unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.as_deref(), Some("out\n"));
        assert_eq!(out.stderr.as_deref(), Some("err\n"));
    }

    #[test]
    fn test_merged_streams_keep_order() {
        let out = run_cmd_wait_nofail(&sh("echo one; echo two >&2; echo three"), None, true, &ambient()).unwrap();
        assert_eq!(out.code, Some(0));
        assert_eq!(out.stdout.as_deref(), Some("one\ntwo\nthree\n"));
        assert_eq!(out.stderr, None);
    }

    #[test]
    fn test_stdin_is_fed() {
        let out = run_cmd_wait_nofail(&sh("cat"), Some("y\ny\n"), true, &ambient()).unwrap();
        assert_eq!(out.stdout(), "y\ny\n");
    }

    #[test]
    fn test_unread_stdin_is_not_an_error() {
        let input = "x".repeat(1 << 20);
        let out = run_cmd_wait_nofail(&sh("exit 0"), Some(&input), false, &ambient()).unwrap();
        assert!(out.success());
    }

    #[test]
    fn test_env_replaces_ambient() {
        let mut env = Env::new();
        env.insert("FIXTURE_ONLY".into(), "isolated".into());
        let out = run_cmd_wait_nofail(&sh("printf '%s|%s' \"$FIXTURE_ONLY\" \"$HOME\""), None, true, &env).unwrap();
        assert_eq!(out.stdout(), "isolated|");
    }

    #[test]
    fn test_signal_has_no_exit_code() {
        let out = run_cmd_wait_nofail(&sh("kill -9 $$"), None, true, &ambient()).unwrap();
        assert_eq!(out.code, None);
        assert!(!out.success());
    }

    #[test]
    fn test_run_cmd_wait_raises_on_failure() {
        let err = run_cmd_wait(&sh("echo nope >&2; exit 4"), None, false, &ambient()).unwrap_err();
        match err {
            FixtureError::Command(e) => {
                assert_eq!(e.code, Some(4));
                assert_eq!(e.stderr.as_deref(), Some("nope\n"));
                assert_eq!(e.command[0], "/bin/sh");
            }
            other => panic!("expected CommandError, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_command() {
        assert!(matches!(
            run_cmd_wait_nofail(&[], None, true, &ambient()),
            Err(FixtureError::EmptyCommand)
        ));
    }

    #[test]
    fn test_missing_program() {
        let command = vec!["/nonexistent/taskw-fixture-test".to_string()];
        assert!(matches!(
            run_cmd_wait_nofail(&command, None, true, &ambient()),
            Err(FixtureError::Spawn { .. })
        ));
    }
}

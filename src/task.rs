//! The client fixture: one isolated taskwarrior instance.
//!
//! A [`Task`] owns a private data directory with its own rc file, and runs the client with an environment whose
//! `TASKDATA`/`TASKRC` point there. Several instances can coexist without seeing each other's tasks.
//!
//! ## Lifecycle
//!
//! - Construction creates the directory, writes the rc file, registers a teardown hook, and optionally binds a
//!   taskd server.
//! - Any number of invocations follow.
//! - [`Task::destroy`] (or `Drop`, or the teardown registry) removes the directory exactly once. Afterwards every
//!   invocation fails with [`FixtureError::Destroyed`] and further `destroy` calls do nothing.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use taskw_core::command::{apply_time_override, config_args, full_command};
use taskw_core::diag::{DIAG_SUBCOMMAND, merge_stderr, merge_stdout};
use taskw_core::env::{FAKETIME_PROGRAM, isolation_overrides};
use taskw_core::rc::{self, CLIENT_CERT_FILE, CLIENT_KEY_FILE};
use taskw_core::server_address;

use crate::config::TaskConfig;
use crate::error::{FixtureError, FixtureResult};
use crate::process::{CommandOutput, Env, run_cmd_wait_nofail};
use crate::server::{TaskdServer, TaskdUser};
use crate::teardown::{self, Teardown, TeardownRegistry};

// ============================================================================
// Lifecycle state
// ============================================================================

#[derive(Debug)]
enum Lifecycle {
    Active { datadir: PathBuf },
    /// The directory was handed over to the caller and is no longer removed.
    Kept,
    Destroyed,
}

/// State shared between a fixture and its teardown hook.
#[derive(Debug)]
struct Instance {
    lifecycle: Mutex<Lifecycle>,
}

impl Instance {
    fn new(datadir: PathBuf) -> Self {
        Self {
            lifecycle: Mutex::new(Lifecycle::Active { datadir }),
        }
    }

    fn is_active(&self) -> bool {
        let state = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, Lifecycle::Active { .. })
    }

    fn ensure_active(&self) -> FixtureResult<()> {
        if self.is_active() { Ok(()) } else { Err(FixtureError::Destroyed) }
    }

    /// Remove the data directory and mark the instance destroyed.
    ///
    /// A directory that is already gone counts as removed. Any other removal error leaves the instance active so
    /// the caller may retry.
    fn destroy(&self) -> FixtureResult<()> {
        let mut state = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let Lifecycle::Active { datadir } = &*state else {
            return Ok(());
        };
        match fs::remove_dir_all(datadir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(datadir = %datadir.display(), "data directory already removed");
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(datadir = %datadir.display(), "task instance destroyed");
        *state = Lifecycle::Destroyed;
        Ok(())
    }
}

impl Instance {
    /// Stop managing the data directory without removing it.
    fn keep(&self) {
        let mut state = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, Lifecycle::Active { .. }) {
            *state = Lifecycle::Kept;
        }
    }
}

impl Teardown for Instance {
    fn teardown(&self) -> FixtureResult<()> {
        self.destroy()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configure and create a [`Task`].
#[derive(Default)]
pub struct TaskBuilder {
    config: TaskConfig,
    taskd: Option<Arc<dyn TaskdServer>>,
    registry: Option<Arc<TeardownRegistry>>,
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    /// Client binary to run.
    pub fn taskw(mut self, taskw: impl Into<String>) -> Self {
        self.config.taskw = taskw.into();
        self
    }

    /// Bind the client to this server right after construction.
    pub fn taskd(mut self, server: Arc<dyn TaskdServer>) -> Self {
        self.taskd = Some(server);
        self
    }

    /// Register the teardown hook here instead of in [`teardown::global`].
    pub fn registry(mut self, registry: Arc<TeardownRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Create the data directory and rc file, and bind the server if one was given.
    ///
    /// ## Errors
    ///
    /// Fails if the directory or rc file cannot be created, or if binding the server fails.
    pub fn build(self) -> FixtureResult<Task> {
        let TaskBuilder { config, taskd, registry } = self;

        let dir = {
            let mut builder = tempfile::Builder::new();
            builder.prefix(&config.datadir_prefix);
            match &config.temp_root {
                Some(root) => builder.tempdir_in(root)?,
                None => builder.tempdir()?,
            }
        };
        let datadir = dir.keep();
        let taskrc = datadir.join(&config.taskrc_name);

        let instance = Arc::new(Instance::new(datadir.clone()));
        let hook: Weak<Instance> = Arc::downgrade(&instance);
        registry.as_ref().unwrap_or_else(|| teardown::global()).register(hook);

        let mut task = Task {
            taskw: config.taskw.clone(),
            taskd: None,
            command: vec![config.taskw],
            datadir,
            taskrc,
            env: Env::new(),
            credentials: None,
            instance,
        };
        task.reset_env();

        fs::write(&task.taskrc, rc::initial_contents(&task.datadir.to_string_lossy()))?;
        tracing::info!(datadir = %task.datadir.display(), taskw = %task.taskw, "task instance created");

        if let Some(server) = taskd {
            task.bind_taskd_server(server)?;
        }
        Ok(task)
    }
}

// ============================================================================
// Task
// ============================================================================

/// An isolated taskwarrior client.
///
/// A client must not be used after being destroyed.
pub struct Task {
    taskw: String,
    taskd: Option<Arc<dyn TaskdServer>>,
    /// Command prefix: the client, possibly preceded by a time override.
    command: Vec<String>,
    datadir: PathBuf,
    taskrc: PathBuf,
    env: Env,
    credentials: Option<String>,
    instance: Arc<Instance>,
}

impl Task {
    /// Create a client with the default configuration and no server.
    pub fn new() -> FixtureResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> TaskBuilder {
        TaskBuilder::new()
    }

    pub fn taskw(&self) -> &str {
        &self.taskw
    }

    pub fn datadir(&self) -> &Path {
        &self.datadir
    }

    pub fn taskrc(&self) -> &Path {
        &self.taskrc
    }

    /// Environment every invocation runs with.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Current command prefix.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// `org/user/key` identifier, once a user has been assigned.
    pub fn credentials(&self) -> Option<&str> {
        self.credentials.as_deref()
    }

    pub fn taskd(&self) -> Option<&Arc<dyn TaskdServer>> {
        self.taskd.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        !self.instance.is_active()
    }

    /// Rebuild the environment from the current ambient one, re-pointing `TASKDATA` and `TASKRC` at this
    /// instance.
    pub fn reset_env(&mut self) {
        let mut env: Env = std::env::vars_os().collect();
        let overrides = isolation_overrides(self.datadir.as_os_str(), self.taskrc.as_os_str());
        for (name, value) in overrides {
            env.insert(name.into(), value.to_os_string());
        }
        self.env = env;
    }

    /// Configure this client to sync with `server` and assign the server's default user.
    ///
    /// Also done automatically by [`TaskBuilder::taskd`].
    ///
    /// ## Errors
    ///
    /// [`FixtureError::Command`] when the client refuses one of the `config` writes.
    pub fn bind_taskd_server(&mut self, server: Arc<dyn TaskdServer>) -> FixtureResult<()> {
        self.instance.ensure_active()?;
        self.taskd = Some(Arc::clone(&server));

        let cert = server.cert_path().join(CLIENT_CERT_FILE);
        let key = server.cert_path().join(CLIENT_KEY_FILE);
        self.config_checked(rc::TASKD_CERTIFICATE, &cert.to_string_lossy())?;
        self.config_checked(rc::TASKD_KEY, &key.to_string_lossy())?;
        self.config_checked(rc::TASKD_CA, &server.ca_cert().to_string_lossy())?;
        self.config_checked(rc::TASKD_SERVER, &server_address(server.address(), server.port()))?;

        self.set_taskd_user(None, true)
    }

    /// Assign a taskd user to this client.
    ///
    /// ## Parameters
    /// - `user`: used verbatim when given; `default` is then ignored.
    /// - `default`: without an explicit user, reuse the server's default user (`true`) or mint a new one.
    ///
    /// ## Errors
    ///
    /// [`FixtureError::NoServer`] when no user is given and no server is bound, and [`FixtureError::Command`] when
    /// the client refuses the `taskd.credentials` write. The current credentials are kept in both cases.
    pub fn set_taskd_user(&mut self, user: Option<TaskdUser>, default: bool) -> FixtureResult<()> {
        let user = match user {
            Some(user) => user,
            None => {
                let server = self.taskd.as_ref().ok_or(FixtureError::NoServer)?;
                if default { server.default_user() } else { server.create_user()? }
            }
        };

        let credentials = user.credentials();
        self.config_checked(rc::TASKD_CREDENTIALS, &credentials)?;
        self.credentials = Some(credentials);
        Ok(())
    }

    /// Run `task config -- <key> <value>`.
    ///
    /// The exit code is not interpreted; that is left to the caller.
    pub fn config(&self, key: &str, value: &str) -> FixtureResult<CommandOutput> {
        self.instance.ensure_active()?;
        let command = config_args(&self.taskw, key, value);
        run_cmd_wait_nofail(&command, None, false, &self.env)
    }

    /// Like [`Task::config`], but a non-zero exit becomes a [`FixtureError::Command`].
    fn config_checked(&self, key: &str, value: &str) -> FixtureResult<()> {
        let output = self.config(key, value)?;
        if !output.success() {
            return Err(output.into_error(config_args(&self.taskw, key, value)).into());
        }
        Ok(())
    }

    fn invoke<S: AsRef<str>>(
        &self,
        args: &[S],
        input: Option<&str>,
        merge_streams: bool,
    ) -> FixtureResult<(Vec<String>, CommandOutput)> {
        self.instance.ensure_active()?;
        let command = full_command(&self.command, args);
        let output = run_cmd_wait_nofail(&command, input, merge_streams, &self.env)?;
        Ok((command, output))
    }

    /// Run the client and require a zero exit code.
    ///
    /// ## Parameters
    /// - `args`: arguments after the command prefix.
    /// - `input`: text fed to stdin, such as `"y\ny\n"` for confirmations.
    /// - `merge_streams`: fold stderr into stdout.
    ///
    /// ## Errors
    ///
    /// [`FixtureError::Command`] when the exit code is not `0`.
    pub fn run_success<S: AsRef<str>>(
        &self,
        args: &[S],
        input: Option<&str>,
        merge_streams: bool,
    ) -> FixtureResult<CommandOutput> {
        let (command, output) = self.invoke(args, input, merge_streams)?;
        if output.code != Some(0) {
            return Err(output.into_error(command).into());
        }
        Ok(output)
    }

    /// Run the client and require a known, non-zero exit code.
    ///
    /// ## Errors
    ///
    /// [`FixtureError::Command`] when the exit code is `0` or unknown.
    pub fn run_error<S: AsRef<str>>(
        &self,
        args: &[S],
        input: Option<&str>,
        merge_streams: bool,
    ) -> FixtureResult<CommandOutput> {
        let (command, output) = self.invoke(args, input, merge_streams)?;
        if matches!(output.code, Some(0) | None) {
            return Err(output.into_error(command).into());
        }
        Ok(output)
    }

    /// Shorthand for `run_success(args, None, true)`.
    pub fn call<S: AsRef<str>>(&self, args: &[S]) -> FixtureResult<CommandOutput> {
        self.run_success(args, None, true)
    }

    /// Run `task diag`, optionally attaching it to the output of an earlier, failed command.
    ///
    /// This never fails. If `diag` itself cannot run, the error text takes the place of its stderr.
    ///
    /// ## Returns
    /// - Without `merge_with`: the diagnostics output.
    /// - With `merge_with`: its exit code, with a labelled diagnostics block appended to its stdout and stderr.
    pub fn diag(&self, merge_with: Option<&CommandOutput>) -> CommandOutput {
        let output = match self.run_success(&[DIAG_SUBCOMMAND], None, true) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("task diag failed: {}", e);
                CommandOutput::new(e.exit_code(), None, Some(e.to_string()))
            }
        };

        let Some(prior) = merge_with else {
            return output;
        };
        CommandOutput::new(
            prior.code,
            Some(merge_stdout(prior.stdout.as_deref(), output.stdout.as_deref())),
            Some(merge_stderr(prior.stderr.as_deref(), output.stderr.as_deref())),
        )
    }

    /// Run following invocations under `faketime -f <spec>`, or with the real clock when `spec` is `None`.
    ///
    /// ## Errors
    ///
    /// [`FixtureError::Skip`] when `faketime` is not on `PATH`.
    pub fn faketime(&mut self, spec: Option<&str>) -> FixtureResult<()> {
        self.instance.ensure_active()?;
        let helper = which::which(FAKETIME_PROGRAM)
            .map_err(|_| FixtureError::Skip("libfaketime/faketime is not installed".to_string()))?;
        self.faketime_with(&helper, spec)
    }

    /// Like [`Task::faketime`], with an explicit helper instead of a `PATH` lookup.
    pub fn faketime_with(&mut self, helper: &Path, spec: Option<&str>) -> FixtureResult<()> {
        self.instance.ensure_active()?;
        self.command = apply_time_override(&self.command, &helper.to_string_lossy(), spec);
        tracing::debug!(command = ?self.command, "command prefix updated");
        Ok(())
    }

    /// Give up the fixture but leave its data directory on disk, for inspection after a failure.
    ///
    /// Neither `Drop` nor the teardown registry will remove the directory afterwards.
    ///
    /// ## Returns
    /// - The data directory, which the caller now owns.
    pub fn keep(self) -> PathBuf {
        self.instance.keep();
        tracing::info!(datadir = %self.datadir.display(), "task instance kept");
        self.datadir.clone()
    }

    /// Remove the data directory. Later calls are no-ops.
    ///
    /// ## Errors
    ///
    /// Removal errors other than "not found"; the instance then stays usable.
    pub fn destroy(&self) -> FixtureResult<()> {
        self.instance.destroy()
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        if let Err(e) = self.instance.destroy() {
            tracing::warn!(datadir = %self.datadir.display(), "cleanup on drop failed: {}", e);
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task running from {}", self.datadir.display())
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("datadir", &self.datadir)
            .field("command", &self.command)
            .field("credentials", &self.credentials)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

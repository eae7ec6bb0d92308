#![forbid(unsafe_code)]
//! Disposable taskwarrior clients for integration tests.
//!
//! Each [`Task`] runs the `task` binary against its own temporary data directory and rc file, so tests never see
//! each other's state. Helpers run the client and check its exit code, attach `task diag` output to failures,
//! fake the clock through `faketime`, and bind the client to a taskd server.
//!
//! ```no_run
//! use taskw_fixture::Task;
//!
//! let task = Task::new()?;
//! task.call(&["add", "buy milk"])?;
//! let list = task.call(&["list"])?;
//! assert!(list.stdout().contains("buy milk"));
//! task.destroy()?;
//! # Ok::<(), taskw_fixture::FixtureError>(())
//! ```
//!
//! ## Panic Policy
//!
//! - **Library code**: Use `Result` with `?` / `map_err`. The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod server;
pub mod task;
pub mod teardown;
pub mod version;

pub use config::TaskConfig;
pub use error::{CommandError, FixtureError, FixtureResult};
pub use process::{CommandOutput, Env, run_cmd_wait, run_cmd_wait_nofail};
pub use server::{StaticTaskdServer, TaskdServer, TaskdUser};
pub use task::{Task, TaskBuilder};
pub use teardown::{ExitGuard, Teardown, TeardownRegistry};

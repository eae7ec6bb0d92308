//! Provide the shared vocabulary and pure helpers for taskwarrior test fixtures.
//!
//! This crate is intentionally small and dependency-free. It holds the names both the fixture library and its
//! command-line front end must agree on, plus deterministic helpers that build command lines and text blocks.
//!
//! ## Notes
//!
//! - This is a "vocabulary" crate: **no IO**, no global state, no process spawning.
//! - Current scope: isolation environment variables, rc-file keys and initial contents, credential and server
//!   address formatting, `config` argument vectors, time-override prefix editing, and diagnostics merging.

pub mod command;
pub mod credentials;
pub mod diag;
pub mod env;
pub mod rc;

pub use command::{apply_time_override, config_args, strip_time_override};
pub use credentials::{credentials_identifier, parse_credentials, server_address};

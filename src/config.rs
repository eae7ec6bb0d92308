//! Fixture configuration
//!
//! Defaults follow what a plain `task` install expects: the binary on `PATH` (or `$TASKW_BIN`), a `task_`-prefixed
//! directory in the system temp dir, and `test.rc` inside it.

use std::env;
use std::path::PathBuf;

use taskw_core::env::{DEFAULT_TASKW, TASKW_BIN};
use taskw_core::rc::{DEFAULT_DATADIR_PREFIX, DEFAULT_TASKRC_NAME};

/// Fixture configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    /// Client binary, resolved on `PATH` by the OS when not a path
    pub taskw: String,
    /// Prefix of the private data directory name
    pub datadir_prefix: String,
    /// File name of the rc file inside the data directory
    pub taskrc_name: String,
    /// Parent of the data directory (system temp dir when `None`)
    pub temp_root: Option<PathBuf>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            taskw: env::var(TASKW_BIN)
                .ok()
                .filter(|bin| !bin.is_empty())
                .unwrap_or_else(|| DEFAULT_TASKW.to_string()),
            datadir_prefix: DEFAULT_DATADIR_PREFIX.to_string(),
            taskrc_name: DEFAULT_TASKRC_NAME.to_string(),
            temp_root: None,
        }
    }
}

impl TaskConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client binary
    pub fn with_taskw(mut self, taskw: impl Into<String>) -> Self {
        self.taskw = taskw.into();
        self
    }

    /// Set the data directory prefix
    pub fn with_datadir_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.datadir_prefix = prefix.into();
        self
    }

    /// Set the rc file name
    pub fn with_taskrc_name(mut self, name: impl Into<String>) -> Self {
        self.taskrc_name = name.into();
        self
    }

    /// Create data directories under `root` instead of the system temp dir
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = TaskConfig::default();
        assert_eq!(config.datadir_prefix, "task_");
        assert_eq!(config.taskrc_name, "test.rc");
        assert_eq!(config.temp_root, None);
        assert!(!config.taskw.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let config = TaskConfig::new()
            .with_taskw("/opt/task/bin/task")
            .with_datadir_prefix("tw_")
            .with_taskrc_name("custom.rc")
            .with_temp_root("/var/tmp");

        assert_eq!(config.taskw, "/opt/task/bin/task");
        assert_eq!(config.datadir_prefix, "tw_");
        assert_eq!(config.taskrc_name, "custom.rc");
        assert_eq!(config.temp_root, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    fn test_builder_override() {
        let config = TaskConfig::new().with_taskw("a").with_taskw("b");
        assert_eq!(config.taskw, "b"); // Last value wins
    }
}

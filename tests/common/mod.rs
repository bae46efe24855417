//! Common test utilities for logbook integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/logbook/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `data_dir`: Holds logbook's data (via `LB_DATA_DIR` env var)
/// - `work_dir`: Working directory for commands (backup files land here)
///
/// The `lb()` method returns a `Command` that sets `LB_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub work_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            work_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the lb binary with isolated data directory.
    pub fn lb(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lb"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("LB_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Get the path to the working directory.
    pub fn work_path(&self) -> &std::path::Path {
        self.work_dir.path()
    }

    /// Run a command and parse its stdout as JSON.
    pub fn lb_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.lb().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "command {:?} produced invalid JSON ({}): {}",
                args,
                e,
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

//! Test support utilities for esec integration tests.
//!
//! Provides an isolated working directory per test and helpers to drive the
//! binary.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with an isolated temp directory.
///
/// Child processes run with `.current_dir()` set to `dir` and a scrubbed
/// `ESEC_*` environment, so tests can run in parallel.
pub struct Test {
    /// Working directory, also used as the vault directory
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a test environment with a config granting `ADMIN_TOKEN` admin
    /// and `READER_TOKEN` read on `PROJECT`, backed by SQLite.
    pub fn with_grants() -> Self {
        let t = Self::new();
        t.write(".esec.toml", &config_with_grants());
        t
    }

    /// Path inside the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file inside the test directory.
    pub fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.path(name), contents).expect("failed to write fixture");
    }

    /// Read a file inside the test directory.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("failed to read file")
    }
}

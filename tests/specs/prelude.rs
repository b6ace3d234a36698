// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI specs.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// `retrace` with color and inherited config disabled.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    fn new() -> Self {
        let mut cmd = Command::cargo_bin("retrace").expect("retrace binary is built");
        cmd.env("NO_COLOR", "1").env_remove("COLOR").env_remove("RETRACE_CONFIG").env_remove("RETRACE_LOG");
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Point `--config` at a service root.
    pub fn root(self, root: &ServiceRoot) -> Self {
        let config = root.config_path();
        let config = config.to_str().expect("utf-8 temp path");
        self.args(&["--config", config])
    }

    pub fn passes(mut self) -> RunOutput {
        let output = self.cmd.output().expect("retrace runs");
        let run = RunOutput::from(output);
        assert_eq!(run.code, Some(0), "expected success\nstdout: {}\nstderr: {}", run.stdout, run.stderr);
        run
    }

    pub fn fails_with(mut self, code: i32) -> RunOutput {
        let output = self.cmd.output().expect("retrace runs");
        let run = RunOutput::from(output);
        assert_eq!(run.code, Some(code), "unexpected exit\nstdout: {}\nstderr: {}", run.stdout, run.stderr);
        run
    }
}

pub struct RunOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for RunOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunOutput {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout lacks {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout.contains(needle), "stdout has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr lacks {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout is JSON")
    }
}

/// A scratch service root with a config file pointing into it.
pub struct ServiceRoot {
    dir: TempDir,
}

impl ServiceRoot {
    pub fn new() -> Self {
        Self::with_options("")
    }

    /// Extra `[retrace]` keys appended after the directory settings.
    pub fn with_options(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().display();
        let config = format!(
            "[retrace]\nLogDir = \"{root}/log\"\nRepoDir = \"{root}/repo\"\nSaveDir = \"{root}/spool\"\nWorkDir = \"{root}/work\"\n{extra}\n"
        );
        std::fs::write(dir.path().join("retrace.toml"), config).expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("retrace.toml")
    }

    pub fn spool(&self) -> PathBuf {
        self.path().join("spool")
    }

    /// A task directory with a password and, optionally, a persisted phase.
    pub fn task(&self, id: &str, password: &str, status_index: Option<u8>) -> PathBuf {
        let dir = self.spool().join(id);
        std::fs::create_dir_all(&dir).expect("create task dir");
        std::fs::write(dir.join("password"), password).expect("write password");
        if let Some(index) = status_index {
            std::fs::write(dir.join("status"), format!("{index}\n")).expect("write status");
        }
        dir
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write file");
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task progress log.
//!
//! Lines go to `<task>/log` while the task runs. Finalizing renames it to
//! `<task>/retrace_log`, which is what marks the task inactive.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use retrace_core::{LifecycleStatus, TaskId, TaskLayout};

/// Scoped task log. Finalizes on drop if not finalized explicitly.
pub struct TaskLogger {
    task_id: TaskId,
    raw: PathBuf,
    finalized: PathBuf,
    file: Option<File>,
}

impl TaskLogger {
    /// Create (or truncate) the task's raw log.
    pub fn open(layout: &TaskLayout) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(layout.raw_log())?;
        Ok(Self {
            task_id: layout.id(),
            raw: layout.raw_log(),
            finalized: layout.finalized_log(),
            file: Some(file),
        })
    }

    /// Append `message` verbatim and flush.
    ///
    /// Failures are logged via tracing but do not propagate. After
    /// finalize this is a no-op.
    pub fn write(&mut self, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = file.write_all(message.as_bytes()).and_then(|()| file.flush()) {
            tracing::warn!(task_id = %self.task_id, error = %e, "failed to write task log");
        }
    }

    /// Append a timestamped line.
    ///
    /// Format: `2026-01-30T08:14:09Z [backtrace] message`
    pub fn line(&mut self, status: LifecycleStatus, message: &str) {
        let text = format_line(&status.to_string(), message);
        self.write(&text);
    }

    pub fn is_finalized(&self) -> bool {
        self.file.is_none()
    }

    /// Close the log and rename it to its finalized name.
    ///
    /// Idempotent; rename failures are logged and swallowed.
    pub fn finalize(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        drop(file);
        match finalize_log(&self.raw, &self.finalized) {
            Ok(_) => tracing::debug!(task_id = %self.task_id, "finalized task log"),
            Err(e) => tracing::warn!(task_id = %self.task_id, error = %e, "failed to finalize task log"),
        }
    }
}

impl Drop for TaskLogger {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Rename `raw` to `finalized` if `raw` exists. Returns whether it did.
pub fn finalize_log(raw: &Path, finalized: &Path) -> io::Result<bool> {
    match fs::rename(raw, finalized) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Append one timestamped line to the log at `path`, creating it if needed.
pub fn append_line(path: &Path, step: &str, message: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_line(step, message).as_bytes())?;
    file.flush()
}

fn format_line(step: &str, message: &str) -> String {
    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!("{ts} [{step}] {message}\n")
}

#[cfg(test)]
#[path = "task_logger_tests.rs"]
mod tests;

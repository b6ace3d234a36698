// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk task namespace: allocation, activity, status, and secrets.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use retrace_core::task::generate_password;
use retrace_core::{Config, CrashFile, LifecycleStatus, OsTaskIds, StatusError, TaskId, TaskIdSource, TaskLayout};
use thiserror::Error;

/// Collisions tolerated before allocation gives up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 50;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("no free task id after {0} attempts")]
    Exhausted(usize),

    #[error("failed to create task directory {0}: {1}")]
    CreateDir(PathBuf, #[source] io::Error),

    #[error("failed to write task password {0}: {1}")]
    Password(PathBuf, #[source] io::Error),
}

#[derive(Debug, Error)]
pub enum StatusWriteError {
    #[error(transparent)]
    Transition(#[from] StatusError),

    #[error("failed to write status {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
}

/// A freshly allocated task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: TaskId,
    pub password: String,
    pub path: PathBuf,
}

/// Owns the task directories under one root.
#[derive(Clone)]
pub struct TaskStore {
    root: PathBuf,
    id_length: usize,
    pass_length: usize,
    ids: Arc<dyn TaskIdSource>,
}

impl TaskStore {
    pub fn new(config: &Config) -> Self {
        Self::with_ids(config, Arc::new(OsTaskIds))
    }

    pub fn with_ids(config: &Config, ids: Arc<dyn TaskIdSource>) -> Self {
        Self {
            root: config.task_root().to_path_buf(),
            id_length: config.task_id_length,
            pass_length: config.task_pass_length,
            ids,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the task root if it does not exist yet.
    pub fn ensure_root(&self) -> Result<(), AllocationError> {
        fs::create_dir_all(&self.root).map_err(|e| AllocationError::CreateDir(self.root.clone(), e))
    }

    pub fn layout(&self, id: TaskId) -> TaskLayout {
        TaskLayout::new(&self.root, id)
    }

    /// Mint a task directory with a fresh ID and password.
    ///
    /// The directory exists before the password file is written; if the
    /// password cannot be written the directory is removed again.
    pub fn allocate(&self) -> Result<NewTask, AllocationError> {
        self.ensure_root()?;

        let mut created = None;
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let id = self.ids.next_id(self.id_length);
            let layout = self.layout(id);
            match fs::create_dir(layout.dir()) {
                Ok(()) => {
                    created = Some(layout);
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(task_id = %id, "task id collision");
                }
                Err(e) => return Err(AllocationError::CreateDir(layout.dir().to_path_buf(), e)),
            }
        }
        let layout = created.ok_or(AllocationError::Exhausted(MAX_ALLOCATION_ATTEMPTS))?;

        let password = generate_password(self.pass_length);
        if let Err(e) = write_secret(&layout.password(), &password) {
            if let Err(cleanup) = fs::remove_dir_all(layout.dir()) {
                tracing::warn!(
                    task_id = %layout.id(),
                    error = %cleanup,
                    "failed to remove partially created task"
                );
            }
            return Err(AllocationError::Password(layout.password(), e));
        }

        tracing::info!(task_id = %layout.id(), "allocated task");
        Ok(NewTask { id: layout.id(), password, path: layout.dir().to_path_buf() })
    }

    /// Tasks whose directory exists and whose log is not finalized.
    ///
    /// Entries that are not exactly `TaskIdLength` digits are ignored. A
    /// missing root has no tasks.
    pub fn list_active(&self) -> io::Result<Vec<TaskId>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut active = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(id) = entry.file_name().to_str().and_then(|n| TaskId::from_dir_name(n, self.id_length))
            else {
                continue;
            };
            if entry.path().is_dir() && self.is_active(id) {
                active.push(id);
            }
        }
        active.sort();
        Ok(active)
    }

    pub fn exists(&self, id: TaskId) -> bool {
        self.layout(id).dir().is_dir()
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        let layout = self.layout(id);
        layout.dir().is_dir() && !layout.finalized_log().exists()
    }

    pub fn required_files_present(&self, id: TaskId) -> bool {
        self.missing_files(id).is_empty()
    }

    pub fn missing_files(&self, id: TaskId) -> Vec<CrashFile> {
        let layout = self.layout(id);
        CrashFile::REQUIRED.into_iter().filter(|f| !layout.crash_file(*f).is_file()).collect()
    }

    /// Time since the task was created, from the password file's mtime
    /// (falling back to the directory's).
    pub fn task_age(&self, id: TaskId, now: SystemTime) -> Option<Duration> {
        let layout = self.layout(id);
        let modified = fs::metadata(layout.password())
            .or_else(|_| fs::metadata(layout.dir()))
            .and_then(|m| m.modified())
            .ok()?;
        Some(now.duration_since(modified).unwrap_or_default())
    }

    /// Current phase; `None` when never set or unreadable.
    pub fn status(&self, id: TaskId) -> Option<LifecycleStatus> {
        let text = fs::read_to_string(self.layout(id).status()).ok()?;
        let index = text.trim().parse::<u8>().ok()?;
        LifecycleStatus::from_index(index).ok()
    }

    /// Persist `next`, refusing to move backwards.
    pub fn set_status(&self, id: TaskId, next: LifecycleStatus) -> Result<(), StatusWriteError> {
        if let Some(current) = self.status(id) {
            current.advance(next)?;
        }
        let path = self.layout(id).status();
        fs::write(&path, format!("{}\n", next.index())).map_err(|e| StatusWriteError::Io(path, e))
    }

    /// Compare `candidate` with the stored secret without early exit on
    /// the first differing byte.
    pub fn verify_password(&self, id: TaskId, candidate: &str) -> bool {
        let Ok(stored) = fs::read_to_string(self.layout(id).password()) else {
            return false;
        };
        let (stored, candidate) = (stored.trim_end().as_bytes(), candidate.as_bytes());
        if stored.len() != candidate.len() {
            return false;
        }
        stored.iter().zip(candidate).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }

    /// Delete the task directory entirely.
    pub fn remove(&self, id: TaskId) -> io::Result<()> {
        fs::remove_dir_all(self.layout(id).dir())
    }
}

fn write_secret(path: &Path, secret: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).mode(0o600).open(path)?;
    file.write_all(secret.as_bytes())?;
    file.sync_all()
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use parking_lot::Mutex;
    use retrace_core::{TaskId, TaskIdSource};
    use std::collections::VecDeque;

    /// Hands out a fixed sequence of IDs, repeating the last one forever.
    pub struct FixedTaskIds {
        queue: Mutex<VecDeque<TaskId>>,
    }

    impl FixedTaskIds {
        pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
            Self { queue: Mutex::new(ids.into_iter().map(TaskId).collect()) }
        }
    }

    impl TaskIdSource for FixedTaskIds {
        fn next_id(&self, _digits: usize) -> TaskId {
            let mut queue = self.queue.lock();
            if queue.len() > 1 {
                queue.pop_front().unwrap_or(TaskId(1))
            } else {
                queue.front().copied().unwrap_or(TaskId(1))
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FixedTaskIds;

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;

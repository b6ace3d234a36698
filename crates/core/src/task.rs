// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identity, secrets, and on-disk layout.
//!
//! ```text
//! <root>/<taskid>/password
//! <root>/<taskid>/status
//! <root>/<taskid>/crash/{coredump, executable, package}
//! <root>/<taskid>/mock.cfg
//! <root>/<taskid>/backtrace
//! <root>/<taskid>/log          (active)
//! <root>/<taskid>/retrace_log  (finalized)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet task passwords are drawn from.
pub const TASKPASS_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// Estimated wall time of one retrace, reported to clients.
pub const ESTIMATED_TASK_SECS: u64 = 180;

/// Numeric task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Parse a directory name as a task ID of exactly `digits` digits.
    ///
    /// Leading zeros are rejected since allocation never produces them and
    /// the name would not round-trip.
    pub fn from_dir_name(name: &str, digits: usize) -> Option<Self> {
        if name.len() != digits || name.starts_with('0') {
            return None;
        }
        if !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok().map(TaskId)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(TaskId)
    }
}

/// Source of candidate task IDs.
pub trait TaskIdSource: Send + Sync {
    /// Return a candidate ID with exactly `digits` decimal digits.
    fn next_id(&self, digits: usize) -> TaskId;
}

/// Candidate IDs uniformly drawn from the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsTaskIds;

impl TaskIdSource for OsTaskIds {
    fn next_id(&self, digits: usize) -> TaskId {
        let (low, high) = id_range(digits);
        TaskId(OsRng.gen_range(low..=high))
    }
}

/// Inclusive range of IDs with exactly `digits` digits.
pub fn id_range(digits: usize) -> (u64, u64) {
    let digits = digits.clamp(1, 18) as u32;
    let low = if digits == 1 { 1 } else { 10u64.pow(digits - 1) };
    (low, 10u64.pow(digits) - 1)
}

/// Generate a task password of `len` characters from [`TASKPASS_ALPHABET`].
pub fn generate_password(len: usize) -> String {
    nanoid::nanoid!(len, &TASKPASS_ALPHABET)
}

/// Artifacts every task must provide before it can be retraced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrashFile {
    Coredump,
    Executable,
    Package,
}

impl CrashFile {
    pub const REQUIRED: [CrashFile; 3] = [CrashFile::Coredump, CrashFile::Executable, CrashFile::Package];

    pub fn file_name(self) -> &'static str {
        match self {
            CrashFile::Coredump => "coredump",
            CrashFile::Executable => "executable",
            CrashFile::Package => "package",
        }
    }
}

crate::simple_display! {
    CrashFile {
        Coredump => "coredump",
        Executable => "executable",
        Package => "package",
    }
}

/// Paths inside one task directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLayout {
    id: TaskId,
    dir: PathBuf,
}

impl TaskLayout {
    pub fn new(root: &Path, id: TaskId) -> Self {
        Self { id, dir: root.join(id.to_string()) }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn password(&self) -> PathBuf {
        self.dir.join("password")
    }

    pub fn status(&self) -> PathBuf {
        self.dir.join("status")
    }

    pub fn crash_dir(&self) -> PathBuf {
        self.dir.join("crash")
    }

    pub fn crash_file(&self, file: CrashFile) -> PathBuf {
        self.crash_dir().join(file.file_name())
    }

    /// Sandbox configuration, present while the task is active.
    pub fn sandbox_config(&self) -> PathBuf {
        self.dir.join("mock.cfg")
    }

    pub fn backtrace(&self) -> PathBuf {
        self.dir.join("backtrace")
    }

    pub fn raw_log(&self) -> PathBuf {
        self.dir.join("log")
    }

    /// Finalized log; its presence marks the task inactive.
    pub fn finalized_log(&self) -> PathBuf {
        self.dir.join("retrace_log")
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-table capture and process-tree termination.

use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use retrace_core::process::ps_command;
use retrace_core::ProcessSnapshot;
use thiserror::Error;

use crate::subprocess::{CommandRunner, SubprocessError, PROBE_TIMEOUT};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("process listing failed: {0}")]
    Subprocess(#[from] SubprocessError),

    #[error("process listing exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
}

/// Run one process listing and parse it.
pub async fn capture(runner: &dyn CommandRunner) -> Result<ProcessSnapshot, SnapshotError> {
    let output = runner.run(&ps_command(), PROBE_TIMEOUT).await?;
    if !output.success() {
        return Err(SnapshotError::Failed { code: output.exit_code(), stderr: output.stderr.trim().to_string() });
    }
    let snapshot = ProcessSnapshot::parse(&output.stdout);
    tracing::debug!(processes = snapshot.len(), "captured process snapshot");
    Ok(snapshot)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KillError {
    #[error("refusing to signal pid {0}")]
    Protected(u32),

    #[error("pid {0} has already exited")]
    NoSuchProcess(u32),

    #[error("failed to signal pid {pid}: {errno}")]
    Signal { pid: u32, errno: Errno },
}

/// Delivers forced termination to a single process.
pub trait ProcessKiller: Send + Sync {
    fn kill(&self, pid: u32) -> Result<(), KillError>;
}

/// Sends `SIGKILL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigkillKiller;

impl ProcessKiller for SigkillKiller {
    fn kill(&self, pid: u32) -> Result<(), KillError> {
        let raw = i32::try_from(pid).map_err(|_| KillError::Protected(pid))?;
        // 0 and 1 address the process group and init
        if raw <= 1 {
            return Err(KillError::Protected(pid));
        }
        match signal::kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(KillError::NoSuchProcess(pid)),
            Err(errno) => Err(KillError::Signal { pid, errno }),
        }
    }
}

impl<K: ProcessKiller + ?Sized> ProcessKiller for Arc<K> {
    fn kill(&self, pid: u32) -> Result<(), KillError> {
        (**self).kill(pid)
    }
}

/// Kill `pid` and every descendant in `snapshot`.
///
/// Every pid is attempted; the result is `false` if any single kill failed.
pub fn kill_tree(pid: u32, snapshot: &ProcessSnapshot, killer: &dyn ProcessKiller) -> bool {
    let mut all_killed = true;
    for target in snapshot.descendants_of(pid) {
        match killer.kill(target) {
            Ok(()) => tracing::debug!(pid = target, root = pid, "killed process"),
            Err(KillError::NoSuchProcess(_)) => {
                tracing::debug!(pid = target, root = pid, "process already exited");
                all_killed = false;
            }
            Err(e) => {
                tracing::warn!(pid = target, root = pid, error = %e, "failed to kill process");
                all_killed = false;
            }
        }
    }
    all_killed
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{KillError, ProcessKiller};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingKillerState {
        killed: Vec<u32>,
        exited: HashSet<u32>,
    }

    /// Records kill requests instead of signalling.
    #[derive(Clone, Default)]
    pub struct RecordingKiller {
        inner: Arc<Mutex<RecordingKillerState>>,
    }

    impl RecordingKiller {
        pub fn new() -> Self {
            Self::default()
        }

        /// Treat `pid` as already exited.
        pub fn exited(&self, pid: u32) {
            self.inner.lock().exited.insert(pid);
        }

        pub fn killed(&self) -> Vec<u32> {
            self.inner.lock().killed.clone()
        }
    }

    impl ProcessKiller for RecordingKiller {
        fn kill(&self, pid: u32) -> Result<(), KillError> {
            let mut state = self.inner.lock();
            if state.exited.contains(&pid) {
                return Err(KillError::NoSuchProcess(pid));
            }
            state.killed.push(pid);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingKiller;

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

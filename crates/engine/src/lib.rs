// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace-engine: task execution, supervision, and garbage collection

pub mod admission;
pub mod archive;
pub mod intake;
pub mod lock;
pub mod quota;
pub mod reaper;
pub mod sandbox;
pub mod snapshot;
pub mod subprocess;
pub mod task_logger;
pub mod task_store;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use admission::{Admission, AdmissionError, Admitted, QuotaExceededError};
pub use archive::{ArchiveCodec, ArchiveError};
pub use intake::{IntakeError, TaskIntake};
pub use lock::{LockError, LockGuard, LockMarker};
pub use quota::QuotaProbe;
pub use reaper::{cleanup, CleanupReport, ReapReason, ReapReport, ReapedTask, Reaper, ReaperError, StepOutcome};
pub use sandbox::{SandboxError, SandboxRunner, SandboxSpec};
pub use snapshot::{capture, kill_tree, KillError, ProcessKiller, SigkillKiller, SnapshotError};
#[cfg(any(test, feature = "test-support"))]
pub use snapshot::RecordingKiller;
pub use subprocess::{CommandOutput, CommandRunner, SubprocessError, SystemRunner};
#[cfg(any(test, feature = "test-support"))]
pub use subprocess::FakeRunner;
pub use task_logger::TaskLogger;
pub use task_store::{AllocationError, NewTask, StatusWriteError, TaskStore};
#[cfg(any(test, feature = "test-support"))]
pub use task_store::FixedTaskIds;
pub use worker::{RetraceOutcome, RetraceWorker, WorkerError};

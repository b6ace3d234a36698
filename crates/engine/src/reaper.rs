// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Garbage collection of orphaned and expired tasks.
//!
//! One pass captures a single process snapshot, decides which active tasks
//! to reap, kills their process trees, and cleans them up. Cleanup never
//! fails; each step reports whether it ran, had nothing to do, or absorbed
//! an error.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use retrace_core::{Clock, Config, LifecycleStatus, RunningWorker, TaskId};
use thiserror::Error;

use crate::sandbox::SandboxRunner;
use crate::snapshot::{self, kill_tree, ProcessKiller, SnapshotError};
use crate::subprocess::CommandRunner;
use crate::task_logger::{append_line, finalize_log};
use crate::task_store::TaskStore;

/// Line appended to the finalized log of a garbage-collected task.
pub const GC_NOTE: &str = "Killed by garbage collector";

#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("skipping pass: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("skipping pass: cannot list tasks: {0}")]
    List(#[source] io::Error),
}

/// Result of one cleanup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Nothing to do.
    Skipped,
    /// The step failed; the error was logged and swallowed.
    Absorbed(String),
}

impl StepOutcome {
    fn from_io(result: io::Result<()>) -> Self {
        match result {
            Ok(()) => StepOutcome::Done,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StepOutcome::Skipped,
            Err(e) => StepOutcome::Absorbed(e.to_string()),
        }
    }

    pub fn is_absorbed(&self) -> bool {
        matches!(self, StepOutcome::Absorbed(_))
    }
}

retrace_core::simple_display! {
    StepOutcome {
        Done => "done",
        Skipped => "skipped",
        Absorbed(..) => "absorbed",
    }
}

/// Per-step outcome of [`cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub task_id: TaskId,
    pub scrub: StepOutcome,
    pub crash_dir: StepOutcome,
    pub sandbox_config: StepOutcome,
    pub finalize_log: StepOutcome,
    pub gc_note: StepOutcome,
}

impl CleanupReport {
    pub fn steps(&self) -> [(&'static str, &StepOutcome); 5] {
        [
            ("scrub", &self.scrub),
            ("crash_dir", &self.crash_dir),
            ("sandbox_config", &self.sandbox_config),
            ("finalize_log", &self.finalize_log),
            ("gc_note", &self.gc_note),
        ]
    }

    pub fn absorbed(&self) -> usize {
        self.steps().iter().filter(|(_, outcome)| outcome.is_absorbed()).count()
    }
}

/// Release everything a task holds and mark it inactive.
///
/// Safe to call repeatedly and on tasks that are already partly cleaned.
pub async fn cleanup(store: &TaskStore, sandbox: &SandboxRunner, id: TaskId, gc: bool) -> CleanupReport {
    let layout = store.layout(id);

    let scrub = if layout.sandbox_config().is_file() {
        match sandbox.scrub(&layout).await {
            Ok(()) => StepOutcome::Done,
            Err(e) => StepOutcome::Absorbed(e.to_string()),
        }
    } else {
        StepOutcome::Skipped
    };
    let crash_dir = StepOutcome::from_io(fs::remove_dir_all(layout.crash_dir()));
    let sandbox_config = StepOutcome::from_io(fs::remove_file(layout.sandbox_config()));
    let finalize = match finalize_log(&layout.raw_log(), &layout.finalized_log()) {
        Ok(true) => StepOutcome::Done,
        Ok(false) => StepOutcome::Skipped,
        Err(e) => StepOutcome::Absorbed(e.to_string()),
    };
    let gc_note = if gc && layout.dir().is_dir() {
        StepOutcome::from_io(append_line(&layout.finalized_log(), "gc", GC_NOTE))
    } else {
        StepOutcome::Skipped
    };

    let report = CleanupReport { task_id: id, scrub, crash_dir, sandbox_config, finalize_log: finalize, gc_note };
    for (step, outcome) in report.steps() {
        if let StepOutcome::Absorbed(reason) = outcome {
            tracing::warn!(task_id = %id, step, reason = %reason, "cleanup step failed");
        }
    }
    report
}

/// Why a task was reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapReason {
    /// No worker and older than `OrphanGrace`.
    Orphaned { age: Duration },
    /// Older than `DeleteTaskAfter`.
    Expired { age: Duration },
    /// Its worker has run longer than `DeleteTaskAfter`.
    WorkerOverran { pid: u32, elapsed: Duration },
}

impl fmt::Display for ReapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReapReason::Orphaned { age } => write!(f, "orphaned for {}s", age.as_secs()),
            ReapReason::Expired { age } => write!(f, "expired after {}s", age.as_secs()),
            ReapReason::WorkerOverran { pid, elapsed } => {
                write!(f, "worker {pid} running for {}s", elapsed.as_secs())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapedTask {
    pub task_id: TaskId,
    pub reason: ReapReason,
    /// Whether every worker process tree was killed cleanly; `None` when
    /// there was no worker.
    pub killed: Option<bool>,
    pub cleanup: CleanupReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Active tasks examined.
    pub examined: usize,
    pub reaped: Vec<ReapedTask>,
}

pub struct Reaper<C: Clock> {
    store: TaskStore,
    sandbox: SandboxRunner,
    runner: Arc<dyn CommandRunner>,
    killer: Arc<dyn ProcessKiller>,
    clock: C,
    delete_after: Duration,
    orphan_grace: Duration,
}

impl<C: Clock> Reaper<C> {
    pub fn new(
        config: &Config,
        store: TaskStore,
        sandbox: SandboxRunner,
        runner: Arc<dyn CommandRunner>,
        killer: Arc<dyn ProcessKiller>,
        clock: C,
    ) -> Self {
        Self {
            store,
            sandbox,
            runner,
            killer,
            clock,
            delete_after: config.delete_task_after(),
            orphan_grace: config.orphan_grace(),
        }
    }

    /// Run one garbage-collection pass.
    ///
    /// Fails only when the process table or the task list cannot be read,
    /// in which case no task is touched.
    pub async fn collect_once(&self) -> Result<ReapReport, ReaperError> {
        let snapshot = snapshot::capture(self.runner.as_ref()).await?;
        let active = self.store.list_active().map_err(ReaperError::List)?;

        let mut workers: HashMap<TaskId, Vec<RunningWorker>> = HashMap::new();
        for worker in snapshot.running_workers() {
            workers.entry(worker.task_id).or_default().push(worker);
        }

        let now = self.clock.now();
        let mut report = ReapReport { examined: active.len(), reaped: Vec::new() };
        for id in active {
            let Some(age) = self.store.task_age(id, now) else {
                continue;
            };
            let task_workers = workers.get(&id).map(Vec::as_slice).unwrap_or_default();
            let Some(reason) = self.reap_reason(age, task_workers) else {
                continue;
            };

            tracing::info!(task_id = %id, %reason, age_secs = age.as_secs(), "reaping task");
            let killed = (!task_workers.is_empty()).then(|| {
                task_workers.iter().fold(true, |ok, w| kill_tree(w.pid, &snapshot, self.killer.as_ref()) && ok)
            });
            let cleanup = self.cleanup(id, true).await;
            if let Err(e) = self.store.set_status(id, LifecycleStatus::Fail) {
                tracing::debug!(task_id = %id, error = %e, "status left unchanged");
            }
            report.reaped.push(ReapedTask { task_id: id, reason, killed, cleanup });
        }

        tracing::info!(examined = report.examined, reaped = report.reaped.len(), "gc pass complete");
        Ok(report)
    }

    fn reap_reason(&self, age: Duration, workers: &[RunningWorker]) -> Option<ReapReason> {
        if age > self.delete_after {
            return Some(ReapReason::Expired { age });
        }
        if workers.is_empty() {
            return (age > self.orphan_grace).then_some(ReapReason::Orphaned { age });
        }
        workers
            .iter()
            .find(|w| w.elapsed > self.delete_after)
            .map(|w| ReapReason::WorkerOverran { pid: w.pid, elapsed: w.elapsed })
    }

    pub async fn cleanup(&self, id: TaskId, gc: bool) -> CleanupReport {
        cleanup(&self.store, &self.sandbox, id, gc).await
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;

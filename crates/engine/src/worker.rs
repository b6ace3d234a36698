// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retrace worker: drives one task from analysis to a finalized log.

use std::fs;
use std::io;
use std::sync::Arc;

use retrace_core::package::{file_type_command, guess_arch, is_valid_package_name};
use retrace_core::{Clock, Config, CrashFile, CrashStatsRecord, LifecycleStatus, Nvra, TaskId, TaskLayout};
use retrace_storage::StatsStore;
use thiserror::Error;

use crate::quota::QuotaProbe;
use crate::reaper::cleanup;
use crate::sandbox::{SandboxError, SandboxRunner, SandboxSpec};
use crate::snapshot;
use crate::subprocess::{CommandRunner, PROBE_TIMEOUT};
use crate::task_logger::TaskLogger;
use crate::task_store::{StatusWriteError, TaskStore};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("task {0} does not exist")]
    NoSuchTask(TaskId),

    #[error("task {0} has already finished")]
    Finished(TaskId),

    #[error("failed to open task log: {0}")]
    Log(#[source] io::Error),

    #[error("missing crash files: {0}")]
    MissingFiles(String),

    #[error("failed to read package: {0}")]
    Package(#[source] io::Error),

    #[error("unrecognized package {0:?}")]
    InvalidPackage(String),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("gdb produced no output")]
    EmptyBacktrace,

    #[error("failed to save backtrace: {0}")]
    Backtrace(#[source] io::Error),

    #[error(transparent)]
    Status(#[from] StatusWriteError),
}

/// How a task run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetraceOutcome {
    pub task_id: TaskId,
    /// `Success` or `Fail`.
    pub status: LifecycleStatus,
    /// The stats row, when it was stored.
    pub stats: Option<CrashStatsRecord>,
    /// Why the task failed.
    pub error: Option<String>,
}

impl RetraceOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == LifecycleStatus::Success
    }
}

pub struct RetraceWorker<C: Clock> {
    store: TaskStore,
    sandbox: SandboxRunner,
    quota: QuotaProbe,
    stats: StatsStore,
    runner: Arc<dyn CommandRunner>,
    clock: C,
}

impl<C: Clock> RetraceWorker<C> {
    pub fn new(config: &Config, runner: Arc<dyn CommandRunner>, store: TaskStore, clock: C) -> Self {
        Self {
            sandbox: SandboxRunner::new(Arc::clone(&runner), config),
            quota: QuotaProbe::new(Arc::clone(&runner)),
            stats: StatsStore::from_config(config),
            store,
            runner,
            clock,
        }
    }

    /// Run the task through every phase.
    ///
    /// Errors only when the task cannot be started at all; a failed
    /// retrace is reported through the outcome with status `Fail`. The log
    /// is finalized on every path.
    pub async fn run(&self, id: TaskId) -> Result<RetraceOutcome, WorkerError> {
        if !self.store.exists(id) {
            return Err(WorkerError::NoSuchTask(id));
        }
        if !self.store.is_active(id) {
            return Err(WorkerError::Finished(id));
        }
        let layout = self.store.layout(id);
        let mut logger = TaskLogger::open(&layout).map_err(WorkerError::Log)?;
        tracing::info!(task_id = %id, "retrace started");

        match self.retrace(&layout, &mut logger).await {
            Ok(stats) => {
                self.enter(&layout, &mut logger, LifecycleStatus::Success)?;
                logger.finalize();
                tracing::info!(task_id = %id, "retrace finished");
                Ok(RetraceOutcome { task_id: id, status: LifecycleStatus::Success, stats, error: None })
            }
            Err(e) => {
                logger.line(LifecycleStatus::Fail, &e.to_string());
                if let Err(status_err) = self.enter(&layout, &mut logger, LifecycleStatus::Fail) {
                    tracing::warn!(task_id = %id, error = %status_err, "failed to record failure status");
                }
                logger.finalize();
                cleanup(&self.store, &self.sandbox, id, false).await;
                tracing::warn!(task_id = %id, error = %e, "retrace failed");
                Ok(RetraceOutcome {
                    task_id: id,
                    status: LifecycleStatus::Fail,
                    stats: None,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    async fn retrace(
        &self,
        layout: &TaskLayout,
        logger: &mut TaskLogger,
    ) -> Result<Option<CrashStatsRecord>, WorkerError> {
        let id = layout.id();
        let started = self.clock.now();
        let start_time = self.clock.epoch_secs();

        self.enter(layout, logger, LifecycleStatus::Analyzing)?;
        let missing = self.store.missing_files(id);
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(WorkerError::MissingFiles(names.join(", ")));
        }
        let package = fs::read_to_string(layout.crash_file(CrashFile::Package)).map_err(WorkerError::Package)?;
        let package = package.trim().to_string();
        let nvra = match Nvra::parse(&package) {
            Some(nvra) if is_valid_package_name(&package) => nvra,
            _ => return Err(WorkerError::InvalidPackage(package)),
        };
        let arch = self.coredump_arch(layout).await.unwrap_or_else(|| nvra.arch.clone());
        logger.line(LifecycleStatus::Analyzing, &format!("package {package}, arch {arch}"));
        let pre_running = self.running_workers().await;

        self.enter(layout, logger, LifecycleStatus::InitializingSandbox)?;
        self.sandbox.write_config(layout, &SandboxSpec { package: package.clone(), arch: arch.clone() })?;
        self.sandbox.init(layout).await?;
        self.sandbox.copy_in(layout).await?;

        self.enter(layout, logger, LifecycleStatus::GeneratingBacktrace)?;
        let backtrace = self.sandbox.run_backtrace(layout).await;
        if backtrace.trim().is_empty() {
            return Err(WorkerError::EmptyBacktrace);
        }
        fs::write(layout.backtrace(), &backtrace).map_err(WorkerError::Backtrace)?;

        self.enter(layout, logger, LifecycleStatus::CleaningUpSandbox)?;
        let chroot_size = self.quota.dir_size(&SandboxRunner::root_dir(layout)).await;
        if let Err(e) = self.sandbox.scrub(layout).await {
            logger.line(LifecycleStatus::CleaningUpSandbox, &format!("scrub failed: {e}"));
        }

        self.enter(layout, logger, LifecycleStatus::SavingStatistics)?;
        let post_running = self.running_workers().await;
        let duration = self.clock.now().duration_since(started).unwrap_or_default();
        let record = CrashStatsRecord {
            task_id: id,
            package: nvra.name,
            version: nvra.version,
            release: nvra.release,
            arch,
            start_time,
            duration: duration.as_secs() as i64,
            pre_running: pre_running as i64,
            post_running: post_running as i64,
            chroot_size: chroot_size as i64,
        };
        let stored = match self.save_stats(&record).await {
            Ok(()) => Some(record),
            Err(e) => {
                logger.line(LifecycleStatus::SavingStatistics, &format!("failed to save statistics: {e}"));
                tracing::warn!(task_id = %id, error = %e, "failed to save statistics");
                None
            }
        };

        self.enter(layout, logger, LifecycleStatus::Finishing)?;
        if let Err(e) = fs::remove_dir_all(layout.crash_dir()) {
            logger.line(LifecycleStatus::Finishing, &format!("failed to remove crash directory: {e}"));
        }
        if let Err(e) = fs::remove_file(layout.sandbox_config()) {
            logger.line(LifecycleStatus::Finishing, &format!("failed to remove sandbox config: {e}"));
        }

        Ok(stored)
    }

    /// Persist and announce a phase change.
    fn enter(
        &self,
        layout: &TaskLayout,
        logger: &mut TaskLogger,
        status: LifecycleStatus,
    ) -> Result<(), WorkerError> {
        self.store.set_status(layout.id(), status)?;
        logger.line(status, status.description());
        tracing::debug!(task_id = %layout.id(), %status, "entered phase");
        Ok(())
    }

    async fn coredump_arch(&self, layout: &TaskLayout) -> Option<String> {
        let cmd = file_type_command(&layout.crash_file(CrashFile::Coredump));
        match self.runner.run(&cmd, PROBE_TIMEOUT).await {
            Ok(output) => guess_arch(&output.stdout).map(str::to_string),
            Err(e) => {
                tracing::warn!(task_id = %layout.id(), error = %e, "could not identify coredump");
                None
            }
        }
    }

    async fn running_workers(&self) -> usize {
        match snapshot::capture(self.runner.as_ref()).await {
            Ok(snapshot) => snapshot.running_workers().len(),
            Err(e) => {
                tracing::warn!(error = %e, "could not count running workers");
                0
            }
        }
    }

    async fn save_stats(&self, record: &CrashStatsRecord) -> Result<(), retrace_storage::StorageError> {
        self.stats.ensure_schema().await?;
        self.stats.insert(record).await
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

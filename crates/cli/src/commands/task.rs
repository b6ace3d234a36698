// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task command handlers

use std::collections::HashMap;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use retrace_core::process::WORKER_SUBCOMMAND;
use retrace_core::{LifecycleStatus, TaskId};
use retrace_engine::{capture, Admission, ArchiveCodec, IntakeError, NewTask, QuotaProbe, TaskIntake};
use serde::Serialize;

use super::Context;
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_elapsed, print_json, OutputFormat};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task from an uploaded crash archive
    Create {
        /// Path to the uploaded archive
        #[arg(long)]
        archive: PathBuf,
        /// Archive content type (application/x-xz-compressed-tar, application/x-gzip, application/x-tar)
        #[arg(long = "type", value_name = "CONTENT_TYPE")]
        content_type: String,
        /// Start a worker for the new task in the background
        #[arg(long)]
        start: bool,
    },
    /// List active tasks
    List {},
    /// Show the current phase of a task
    Status {
        id: TaskId,
        /// Require the task password
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct Created<'a> {
    id: TaskId,
    password: &'a str,
    worker_pid: Option<u32>,
}

/// One row of `task list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub id: TaskId,
    pub status: Option<LifecycleStatus>,
    pub age_secs: Option<u64>,
    pub worker_pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskState {
    pub id: TaskId,
    pub status: Option<LifecycleStatus>,
    pub active: bool,
    pub description: &'static str,
}

pub async fn handle(command: TaskCommand, ctx: &Context) -> Result<()> {
    match command {
        TaskCommand::Create { archive, content_type, start } => {
            let task = create(ctx, &archive, &content_type).await?;
            let worker_pid = if start { Some(spawn_worker(ctx, task.id)?) } else { None };
            match ctx.format {
                OutputFormat::Text => {
                    println!("Task {} created", color::header(&task.id.to_string()));
                    println!("password: {}", task.password);
                    if let Some(pid) = worker_pid {
                        println!("worker: {pid}");
                    }
                }
                OutputFormat::Json => {
                    print_json(&Created { id: task.id, password: &task.password, worker_pid })?;
                }
            }
        }
        TaskCommand::List {} => {
            let rows = list(ctx).await?;
            match ctx.format {
                OutputFormat::Text => print!("{}", format_rows(&rows)),
                OutputFormat::Json => print_json(&rows)?,
            }
        }
        TaskCommand::Status { id, password } => {
            let state = status(ctx, id, password.as_deref())?;
            match ctx.format {
                OutputFormat::Text => {
                    let phase = match state.status {
                        Some(s) => color::status(s, &s.to_string()),
                        None => "-".to_string(),
                    };
                    println!("{} [{}] {}", state.id, phase, state.description);
                }
                OutputFormat::Json => print_json(&state)?,
            }
        }
    }
    Ok(())
}

/// Admit and unpack an upload, refusing it when too many workers run.
pub async fn create(ctx: &Context, archive: &Path, content_type: &str) -> Result<NewTask> {
    let runner = ctx.runner.clone();
    let admission =
        Admission::new(&ctx.config, QuotaProbe::new(runner.clone()), ArchiveCodec::new(runner.clone()));
    let snapshot = capture(runner.as_ref()).await.context("cannot read the process table")?;
    admission.ensure_capacity(&snapshot).map_err(ExitError::rejected)?;

    let intake = TaskIntake::new(admission, ArchiveCodec::new(runner), ctx.store());
    match intake.create(archive, content_type).await {
        Ok(task) => Ok(task),
        Err(IntakeError::Admission(e)) => Err(ExitError::rejected(e).into()),
        Err(e) => Err(e.into()),
    }
}

/// Start `retrace worker <id>` detached from this process.
fn spawn_worker(ctx: &Context, id: TaskId) -> Result<u32> {
    let exe = std::env::current_exe().context("cannot locate the retrace binary")?;
    let child = std::process::Command::new(exe)
        .arg("--config")
        .arg(&ctx.config_path)
        .arg(WORKER_SUBCOMMAND)
        .arg(id.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .with_context(|| format!("failed to start worker for task {id}"))?;
    tracing::info!(task_id = %id, pid = child.id(), "worker started");
    Ok(child.id())
}

/// Active tasks with their phase, age, and worker.
///
/// Worker pids are omitted when the process table cannot be read.
pub async fn list(ctx: &Context) -> Result<Vec<TaskRow>> {
    let store = ctx.store();
    let ids = store.list_active().with_context(|| format!("cannot list tasks in {}", store.root().display()))?;
    let workers: HashMap<TaskId, u32> = match capture(ctx.runner.as_ref()).await {
        Ok(snapshot) => snapshot.running_workers().into_iter().map(|w| (w.task_id, w.pid)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read process table, worker pids unknown");
            HashMap::new()
        }
    };
    let now = SystemTime::now();
    Ok(ids
        .into_iter()
        .map(|id| TaskRow {
            id,
            status: store.status(id),
            age_secs: store.task_age(id, now).map(|age| age.as_secs()),
            worker_pid: workers.get(&id).copied(),
        })
        .collect())
}

pub fn format_rows(rows: &[TaskRow]) -> String {
    if rows.is_empty() {
        return "No active tasks\n".to_string();
    }
    let mut out = format!("{}\n", color::header(&format!("{:<20} {:<10} {:>5}  WORKER", "ID", "STATUS", "AGE")));
    for row in rows {
        let status = row.status.map_or_else(|| "queued".to_string(), |s| s.to_string());
        let age = row.age_secs.map_or_else(|| "-".to_string(), format_elapsed);
        let worker = row.worker_pid.map_or_else(|| color::context("-"), |pid| pid.to_string());
        out.push_str(&format!("{:<20} {:<10} {:>5}  {}\n", row.id, status, age, worker));
    }
    out
}

/// Current phase of a task, checking the password when one is given.
pub fn status(ctx: &Context, id: TaskId, password: Option<&str>) -> Result<TaskState> {
    let store = ctx.store();
    if !store.exists(id) {
        return Err(ExitError::not_found(format!("task {id}")).into());
    }
    if let Some(candidate) = password {
        if !store.verify_password(id, candidate) {
            // Same answer as a missing task
            return Err(ExitError::not_found(format!("task {id}")).into());
        }
    }
    let status = store.status(id);
    let active = store.is_active(id);
    let description = match status {
        Some(status) => status.description(),
        None if active => "Waiting for a worker",
        None => "Finished",
    };
    Ok(TaskState { id, status, active, description })
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker entry point: `retrace worker <id>`.

use anyhow::Result;
use retrace_core::{Clock, SystemClock, TaskId};
use retrace_engine::{RetraceOutcome, RetraceWorker};

use super::Context;
use crate::exit_error::{ExitError, TASK_FAILED};
use crate::output::{format_bytes, format_elapsed, print_json, OutputFormat};

pub async fn handle(id: TaskId, ctx: &Context) -> Result<()> {
    let outcome = run(ctx, id, SystemClock).await?;
    match ctx.format {
        OutputFormat::Text => println!("{}", summary(&outcome)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "id": outcome.task_id,
            "status": outcome.status,
            "stats": outcome.stats,
            "error": outcome.error,
        }))?,
    }
    if outcome.succeeded() {
        Ok(())
    } else {
        Err(ExitError::new(TASK_FAILED, format!("task {id} failed")).into())
    }
}

pub async fn run<C: Clock>(ctx: &Context, id: TaskId, clock: C) -> Result<RetraceOutcome> {
    let worker = RetraceWorker::new(&ctx.config, ctx.runner.clone(), ctx.store(), clock);
    Ok(worker.run(id).await?)
}

pub fn summary(outcome: &RetraceOutcome) -> String {
    let mut line = format!("{}: {}", outcome.task_id, outcome.status.description());
    if let Some(error) = &outcome.error {
        line.push_str(&format!(" ({error})"));
    }
    if let Some(stats) = &outcome.stats {
        line.push_str(&format!(
            " in {}, sandbox {}",
            format_elapsed(stats.duration.max(0) as u64),
            format_bytes(stats.chroot_size.max(0) as u64)
        ));
    }
    line
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `retrace gc`: one reaper pass under the gc lock marker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use retrace_core::{Clock, SystemClock};
use retrace_engine::{LockMarker, ProcessKiller, ReapReport, Reaper, SandboxRunner, SigkillKiller};

use super::Context;
use crate::output::{print_json, OutputFormat};

/// Marker file under `SaveDir` held for the length of a pass.
pub const GC_LOCK: &str = "gc.lock";

#[derive(Debug)]
pub enum GcOutcome {
    /// Another pass holds the marker, or an operator pinned it.
    Skipped { marker: PathBuf, reason: Option<String> },
    Collected(ReapReport),
}

pub async fn handle(ctx: &Context) -> Result<()> {
    let outcome = collect(ctx, Arc::new(SigkillKiller), SystemClock).await?;
    match ctx.format {
        OutputFormat::Text => print!("{}", format_outcome(&outcome)),
        OutputFormat::Json => print_json(&json_outcome(&outcome))?,
    }
    Ok(())
}

pub async fn collect<C: Clock>(ctx: &Context, killer: Arc<dyn ProcessKiller>, clock: C) -> Result<GcOutcome> {
    let save_dir = &ctx.config.save_dir;
    std::fs::create_dir_all(save_dir).with_context(|| format!("cannot create {}", save_dir.display()))?;

    let marker = LockMarker::new(save_dir.join(GC_LOCK));
    let Some(guard) = marker.try_acquire()? else {
        tracing::info!(marker = %marker.path().display(), "gc pass already in progress, skipping");
        return Ok(GcOutcome::Skipped { marker: marker.path().to_path_buf(), reason: marker.reason() });
    };

    let sandbox = SandboxRunner::new(ctx.runner.clone(), &ctx.config);
    let reaper = Reaper::new(&ctx.config, ctx.store(), sandbox, ctx.runner.clone(), killer, clock);
    let report = reaper.collect_once().await;
    guard.release()?;
    Ok(GcOutcome::Collected(report?))
}

pub fn format_outcome(outcome: &GcOutcome) -> String {
    let report = match outcome {
        GcOutcome::Skipped { marker, reason: None } => {
            return format!("Skipped: {} is held by another pass\n", marker.display());
        }
        GcOutcome::Skipped { marker, reason: Some(reason) } => {
            return format!("Skipped: {} is pinned: {reason}\n", marker.display());
        }
        GcOutcome::Collected(report) => report,
    };

    let mut out = format!("Examined {} task(s), reaped {}\n", report.examined, report.reaped.len());
    for task in &report.reaped {
        let kill = match task.killed {
            None => "no worker",
            Some(true) => "worker killed",
            Some(false) => "kill incomplete",
        };
        out.push_str(&format!("  {}: {}, {kill}", task.task_id, task.reason));
        let absorbed = task.cleanup.absorbed();
        if absorbed > 0 {
            out.push_str(&format!(", {absorbed} cleanup step(s) failed"));
        }
        out.push('\n');
    }
    out
}

fn json_outcome(outcome: &GcOutcome) -> serde_json::Value {
    match outcome {
        GcOutcome::Skipped { marker, reason } => serde_json::json!({
            "skipped": true,
            "marker": marker,
            "reason": reason,
        }),
        GcOutcome::Collected(report) => serde_json::json!({
            "skipped": false,
            "examined": report.examined,
            "reaped": report.reaped.iter().map(|t| serde_json::json!({
                "id": t.task_id,
                "reason": t.reason.to_string(),
                "killed": t.killed,
                "cleanup": t.cleanup.steps().iter()
                    .map(|(step, outcome)| (step.to_string(), serde_json::Value::from(outcome.to_string())))
                    .collect::<serde_json::Map<_, _>>(),
            })).collect::<Vec<_>>(),
        }),
    }
}

#[cfg(test)]
#[path = "gc_tests.rs"]
mod tests;

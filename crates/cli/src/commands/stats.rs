// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Statistics command handlers

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use retrace_core::CrashStatsRecord;
use retrace_storage::StatsStore;

use super::Context;
use crate::color;
use crate::output::{format_bytes, format_elapsed, print_json, OutputFormat};

#[derive(Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Subcommand)]
pub enum StatsCommand {
    /// Create the statistics table if it does not exist
    Init,
    /// Show recorded statistics, oldest first
    Show,
}

pub async fn handle(command: StatsCommand, ctx: &Context) -> Result<()> {
    let store = open(ctx).await?;
    match command {
        StatsCommand::Init => match ctx.format {
            OutputFormat::Text => println!("Statistics database ready at {}", store.path().display()),
            OutputFormat::Json => print_json(&serde_json::json!({ "path": store.path() }))?,
        },
        StatsCommand::Show => {
            let records = store.records().await?;
            match ctx.format {
                OutputFormat::Text => print!("{}", format_records(&records)),
                OutputFormat::Json => print_json(&records)?,
            }
        }
    }
    Ok(())
}

/// The stats store with its schema in place.
pub async fn open(ctx: &Context) -> Result<StatsStore> {
    let save_dir = &ctx.config.save_dir;
    std::fs::create_dir_all(save_dir).with_context(|| format!("cannot create {}", save_dir.display()))?;
    let store = StatsStore::from_config(&ctx.config);
    store.ensure_schema().await?;
    Ok(store)
}

pub fn format_records(records: &[CrashStatsRecord]) -> String {
    if records.is_empty() {
        return "No statistics recorded\n".to_string();
    }
    let mut out = format!(
        "{}\n",
        color::header(&format!(
            "{:<12} {:<24} {:<16} {:<8} {:>8} {:>10}  {}",
            "TASK", "PACKAGE", "VERSION", "ARCH", "DURATION", "SANDBOX", "WORKERS"
        ))
    );
    for r in records {
        let version = format!("{}-{}", r.version, r.release);
        out.push_str(&format!(
            "{:<12} {:<24} {:<16} {:<8} {:>8} {:>10}  {}/{}\n",
            r.task_id,
            r.package,
            version,
            r.arch,
            format_elapsed(r.duration.max(0) as u64),
            format_bytes(r.chroot_size.max(0) as u64),
            r.pre_running,
            r.post_running,
        ));
    }
    out
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace: operator and worker entry points for the crash retrace service

mod color;
mod commands;
mod env;
mod exit_error;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use retrace_core::TaskId;

use commands::{gc, stats, task, worker, Context};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "retrace", version = env::VERSION, styles = color::styles())]
#[command(about = "Retrace crash dumps in disposable build roots")]
struct Cli {
    /// Config file (default: $RETRACE_CONFIG, then /etc/retrace-server.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value_t)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, and inspect tasks
    Task(task::TaskArgs),
    /// Retrace one task (normally started by `task create --start`)
    Worker {
        /// Task ID
        id: TaskId,
    },
    /// Reap stale tasks and their workers
    Gc,
    /// Manage the crash statistics database
    Stats(stats::StatsArgs),
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(env::config_path(cli.config), cli.output)?;
    let _guard = logging::init(&ctx.config.log_dir);
    tracing::debug!(config = %ctx.config_path.display(), "configuration loaded");

    match cli.command {
        Commands::Task(args) => task::handle(args.command, &ctx).await,
        Commands::Worker { id } => worker::handle(id, &ctx).await,
        Commands::Gc => gc::handle(&ctx).await,
        Commands::Stats(args) => stats::handle(args.command, &ctx).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_error::exit_code(&err));
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

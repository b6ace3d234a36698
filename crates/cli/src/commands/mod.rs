// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod gc;
pub mod stats;
pub mod task;
pub mod worker;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use retrace_core::Config;
use retrace_engine::{CommandRunner, SystemRunner, TaskStore};

use crate::output::OutputFormat;

/// Everything a handler needs: loaded config and the tool runner.
pub struct Context {
    pub config: Config,
    /// Passed on to spawned workers.
    pub config_path: PathBuf,
    pub runner: Arc<dyn CommandRunner>,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(config_path: PathBuf, format: OutputFormat) -> Result<Self> {
        let config = Config::load(&config_path)?;
        Ok(Self { config, config_path, runner: Arc::new(SystemRunner), format })
    }

    pub fn store(&self) -> TaskStore {
        TaskStore::new(&self.config)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;

use retrace_core::DEFAULT_CONFIG_PATH;

/// Version string shown by `--version`.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")");

pub const CONFIG_VAR: &str = "RETRACE_CONFIG";
pub const LOG_VAR: &str = "RETRACE_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

/// Resolve the config file: `--config` > RETRACE_CONFIG > the system default.
pub fn config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_VAR).filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Tracing filter directives (default `info`).
pub fn log_filter() -> String {
    std::env::var(LOG_VAR).ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

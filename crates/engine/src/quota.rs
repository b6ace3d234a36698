// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disk measurements through external tools.

use std::path::{self, Path};
use std::sync::Arc;

use retrace_core::probe;

use crate::subprocess::{CommandRunner, PROBE_TIMEOUT};

/// Free-space and directory-size queries. Stateless.
#[derive(Clone)]
pub struct QuotaProbe {
    runner: Arc<dyn CommandRunner>,
}

impl QuotaProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Available bytes on the filesystem holding `path`; `None` when unknown.
    pub async fn free_space(&self, path: &Path) -> Option<u64> {
        let cmd = probe::free_space_command(path);
        match self.runner.run(&cmd, PROBE_TIMEOUT).await {
            Ok(output) => {
                let resolved = std::fs::canonicalize(path)
                    .or_else(|_| path::absolute(path))
                    .unwrap_or_else(|_| path.to_path_buf());
                let free = probe::parse_free_space(&output.stdout, &resolved);
                if free.is_none() {
                    tracing::warn!(path = %path.display(), "no df row for the path's mount");
                }
                free
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "free-space probe failed");
                None
            }
        }
    }

    /// Total bytes under `path`; 0 when the measurement yields nothing.
    pub async fn dir_size(&self, path: &Path) -> u64 {
        let cmd = probe::dir_size_command(path);
        match self.runner.run(&cmd, PROBE_TIMEOUT).await {
            Ok(output) => probe::parse_dir_size(&output.stdout),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "directory-size probe failed");
                0
            }
        }
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;

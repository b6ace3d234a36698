// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive size estimation and extraction.

use std::path::Path;
use std::sync::Arc;

use retrace_core::{ArchiveFormat, UnsupportedFormatError};
use thiserror::Error;

use crate::subprocess::{CommandRunner, SubprocessError, PROBE_TIMEOUT, UNPACK_TIMEOUT};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFormatError),

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// Dispatches archive operations on the declared content type.
#[derive(Clone)]
pub struct ArchiveCodec {
    runner: Arc<dyn CommandRunner>,
}

impl ArchiveCodec {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Uncompressed size reported by the format's listing tool.
    ///
    /// `Ok(None)` when no listing line matches, which is distinct from a
    /// zero-byte archive.
    pub async fn estimate_unpacked_size(
        &self,
        archive: &Path,
        content_type: &str,
    ) -> Result<Option<u64>, ArchiveError> {
        let format = ArchiveFormat::from_content_type(content_type)?;
        let output = self.runner.run(&format.size_command(archive), PROBE_TIMEOUT).await?;
        let size = format.parse_unpacked_size(&output.stdout);
        tracing::debug!(archive = %archive.display(), %format, ?size, "estimated unpacked size");
        Ok(size)
    }

    /// Extract `archive` into `dest` and return the tool's exit code.
    ///
    /// A non-zero code is the caller's to interpret.
    pub async fn unpack(&self, archive: &Path, content_type: &str, dest: &Path) -> Result<i32, ArchiveError> {
        let format = ArchiveFormat::from_content_type(content_type)?;
        let cmd = format.unpack_command(archive).current_dir(dest);
        let output = self.runner.run(&cmd, UNPACK_TIMEOUT).await?;
        if !output.success() {
            tracing::warn!(
                archive = %archive.display(),
                code = output.exit_code(),
                stderr = %output.stderr.trim(),
                "unpack failed"
            );
        }
        Ok(output.exit_code())
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;

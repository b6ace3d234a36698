// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload admission: size and disk quotas, and worker capacity.

use std::path::{Path, PathBuf};

use retrace_core::{ArchiveFormat, Config, ProcessSnapshot};
use thiserror::Error;

use crate::archive::{ArchiveCodec, ArchiveError};
use crate::quota::QuotaProbe;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotaExceededError {
    #[error("archive is {size} bytes, the limit is {limit}")]
    PackedSize { size: u64, limit: u64 },

    #[error("{available} bytes free, at least {required} required")]
    FreeSpace { available: u64, required: u64 },

    #[error("free space could not be determined")]
    FreeSpaceUnknown,

    #[error("archive unpacks to {size} bytes, the limit is {limit}")]
    UnpackedSize { size: u64, limit: u64 },

    #[error("unpacked size could not be determined")]
    UnpackedSizeUnknown,

    #[error("{running} tasks running, the limit is {limit}")]
    TooManyTasks { running: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Quota(#[from] QuotaExceededError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Measurements of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admitted {
    pub format: ArchiveFormat,
    pub packed_size: u64,
    pub unpacked_size: u64,
    pub free_space: u64,
}

#[derive(Clone)]
pub struct Admission {
    quota: QuotaProbe,
    codec: ArchiveCodec,
    task_root: PathBuf,
    max_packed: u64,
    max_unpacked: u64,
    min_free: u64,
    max_parallel: usize,
}

impl Admission {
    pub fn new(config: &Config, quota: QuotaProbe, codec: ArchiveCodec) -> Self {
        Self {
            quota,
            codec,
            task_root: config.task_root().to_path_buf(),
            max_packed: config.max_packed_bytes(),
            max_unpacked: config.max_unpacked_bytes(),
            min_free: config.min_storage_bytes(),
            max_parallel: config.max_parallel_tasks,
        }
    }

    /// Decide whether `archive` may be unpacked.
    ///
    /// Checked in order: content type, packed size, free space at the task
    /// root, estimated unpacked size. An estimate that cannot be obtained
    /// is a rejection.
    pub async fn check(
        &self,
        archive: &Path,
        content_type: &str,
        packed_size: u64,
    ) -> Result<Admitted, AdmissionError> {
        let format = ArchiveFormat::from_content_type(content_type).map_err(ArchiveError::from)?;

        if packed_size > self.max_packed {
            return Err(QuotaExceededError::PackedSize { size: packed_size, limit: self.max_packed }.into());
        }

        let free_space = self.quota.free_space(&self.task_root).await.ok_or(QuotaExceededError::FreeSpaceUnknown)?;
        if free_space < self.min_free {
            return Err(QuotaExceededError::FreeSpace { available: free_space, required: self.min_free }.into());
        }

        let unpacked_size = self
            .codec
            .estimate_unpacked_size(archive, content_type)
            .await?
            .ok_or(QuotaExceededError::UnpackedSizeUnknown)?;
        if unpacked_size > self.max_unpacked {
            return Err(QuotaExceededError::UnpackedSize { size: unpacked_size, limit: self.max_unpacked }.into());
        }

        tracing::info!(
            archive = %archive.display(),
            %format,
            packed_size,
            unpacked_size,
            free_space,
            "upload admitted"
        );
        Ok(Admitted { format, packed_size, unpacked_size, free_space })
    }

    /// Reject new work while `MaxParallelTasks` workers are running.
    ///
    /// Returns the number of running workers otherwise.
    pub fn ensure_capacity(&self, snapshot: &ProcessSnapshot) -> Result<usize, QuotaExceededError> {
        let running = snapshot.running_workers().len();
        if running >= self.max_parallel {
            return Err(QuotaExceededError::TooManyTasks { running, limit: self.max_parallel });
        }
        Ok(running)
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;

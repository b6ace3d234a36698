// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task creation from an uploaded archive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use retrace_core::{CrashFile, TaskId};
use thiserror::Error;

use crate::admission::{Admission, AdmissionError};
use crate::archive::{ArchiveCodec, ArchiveError};
use crate::task_store::{AllocationError, NewTask, TaskStore};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("cannot read archive {0}: {1}")]
    Archive(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Unpack(#[from] ArchiveError),

    #[error("unpacking failed with exit code {0}")]
    UnpackFailed(i32),

    #[error("archive is missing required files: {0}")]
    MissingFiles(String),

    #[error("failed to prepare task directory: {0}")]
    Io(#[source] io::Error),
}

#[derive(Clone)]
pub struct TaskIntake {
    admission: Admission,
    codec: ArchiveCodec,
    store: TaskStore,
}

impl TaskIntake {
    pub fn new(admission: Admission, codec: ArchiveCodec, store: TaskStore) -> Self {
        Self { admission, codec, store }
    }

    /// Admit, allocate, and unpack an upload into a new task.
    ///
    /// Nothing is allocated when admission fails. If unpacking fails or the
    /// archive lacks a required file, the new task is removed again.
    pub async fn create(&self, archive: &Path, content_type: &str) -> Result<NewTask, IntakeError> {
        let archive = fs::canonicalize(archive).map_err(|e| IntakeError::Archive(archive.to_path_buf(), e))?;
        let packed_size = fs::metadata(&archive).map_err(|e| IntakeError::Archive(archive.clone(), e))?.len();
        // Free space is measured on the task root, so it has to exist first.
        self.store.ensure_root()?;
        self.admission.check(&archive, content_type, packed_size).await?;

        let task = self.store.allocate()?;
        if let Err(e) = self.unpack(task.id, &archive, content_type).await {
            self.discard(task.id);
            return Err(e);
        }
        tracing::info!(task_id = %task.id, archive = %archive.display(), "task created");
        Ok(task)
    }

    async fn unpack(&self, id: TaskId, archive: &Path, content_type: &str) -> Result<(), IntakeError> {
        let crash_dir = self.store.layout(id).crash_dir();
        fs::create_dir(&crash_dir).map_err(IntakeError::Io)?;
        let code = self.codec.unpack(archive, content_type, &crash_dir).await?;
        if code != 0 {
            return Err(IntakeError::UnpackFailed(code));
        }
        let missing = self.store.missing_files(id);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| CrashFile::file_name(*f)).collect();
            return Err(IntakeError::MissingFiles(names.join(", ")));
        }
        Ok(())
    }

    fn discard(&self, id: TaskId) {
        if let Err(e) = self.store.remove(id) {
            tracing::warn!(task_id = %id, error = %e, "failed to remove rejected task");
        }
    }
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;

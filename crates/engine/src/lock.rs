// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem busy marker.
//!
//! The marker's existence means "busy". A marker with contents carries an
//! operator-written reason and is never removed automatically.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock marker {path} is pinned: {reason}")]
    Sticky { path: PathBuf, reason: String },

    #[error("lock marker {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.path.exists()
    }

    /// A marker with any bytes in it stays until an operator removes it.
    pub fn is_sticky(&self) -> Result<bool, LockError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LockError::Io(self.path.clone(), e)),
        }
    }

    /// Operator-supplied reason for display, if the marker has readable text.
    pub fn reason(&self) -> Option<String> {
        let bytes = fs::read(&self.path).ok()?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Create the marker atomically. `Ok(None)` when it already exists.
    pub fn try_acquire(&self) -> Result<Option<LockGuard<'_>>, LockError> {
        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(_) => Ok(Some(LockGuard { marker: self, released: false })),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(LockError::Io(self.path.clone(), e)),
        }
    }

    /// Remove the marker unless it has contents.
    pub fn release(&self) -> Result<(), LockError> {
        if self.is_sticky()? {
            let reason = self.reason().unwrap_or_else(|| "no reason given".to_string());
            return Err(LockError::Sticky { path: self.path.clone(), reason });
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::Io(self.path.clone(), e)),
        }
    }
}

/// Held marker; released on drop.
#[derive(Debug)]
pub struct LockGuard<'a> {
    marker: &'a LockMarker,
    released: bool,
}

impl LockGuard<'_> {
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.marker.release()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.marker.release() {
            tracing::warn!(error = %e, "lock marker left in place");
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

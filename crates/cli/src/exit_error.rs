// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Handlers return `ExitError` instead of calling `std::process::exit()`
//! so `main()` can flush logs before the process ends.

use std::fmt;

/// Generic failure.
pub const FAILURE: i32 = 1;
/// The upload was refused by admission control.
pub const REJECTED: i32 = 2;
/// The task ran and ended in `Fail`.
pub const TASK_FAILED: i32 = 3;
/// No such task, or the password did not match.
pub const NOT_FOUND: i32 = 4;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self::new(REJECTED, format!("upload rejected: {reason}"))
    }

    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(NOT_FOUND, format!("{what} not found"))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Exit code for an error returned from a handler.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ExitError>().map_or(FAILURE, |e| e.code)
}

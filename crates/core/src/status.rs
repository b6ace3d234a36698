// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle phases.
//!
//! A linear state machine: each phase may only move forward, and the two
//! terminal phases are mutually exclusive.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase of a retrace task, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Analyzing,
    InitializingSandbox,
    GeneratingBacktrace,
    CleaningUpSandbox,
    SavingStatistics,
    Finishing,
    Success,
    Fail,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("status cannot move from {from:?} to {to:?}")]
    Regression { from: LifecycleStatus, to: LifecycleStatus },

    #[error("unknown status index {0}")]
    UnknownIndex(u8),
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 8] = [
        LifecycleStatus::Analyzing,
        LifecycleStatus::InitializingSandbox,
        LifecycleStatus::GeneratingBacktrace,
        LifecycleStatus::CleaningUpSandbox,
        LifecycleStatus::SavingStatistics,
        LifecycleStatus::Finishing,
        LifecycleStatus::Success,
        LifecycleStatus::Fail,
    ];

    /// Position in [`Self::ALL`]; also the on-disk encoding.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Result<Self, StatusError> {
        Self::ALL.get(index as usize).copied().ok_or(StatusError::UnknownIndex(index))
    }

    /// Human-readable description shown to clients.
    pub fn description(self) -> &'static str {
        match self {
            LifecycleStatus::Analyzing => "Analyzing crash data",
            LifecycleStatus::InitializingSandbox => "Initializing virtual root",
            LifecycleStatus::GeneratingBacktrace => "Generating backtrace",
            LifecycleStatus::CleaningUpSandbox => "Cleaning up virtual root",
            LifecycleStatus::SavingStatistics => "Saving crash statistics",
            LifecycleStatus::Finishing => "Finishing task",
            LifecycleStatus::Success => "Retrace job finished successfully",
            LifecycleStatus::Fail => "Retrace job failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleStatus::Success | LifecycleStatus::Fail)
    }

    /// Whether a task in `self` may move to `next`.
    ///
    /// Staying in the same phase is allowed. Any non-terminal phase may jump
    /// forward or fail; nothing leaves a terminal phase.
    pub fn can_advance_to(self, next: LifecycleStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next > self
    }

    /// Validate a transition, returning the new phase.
    pub fn advance(self, next: LifecycleStatus) -> Result<LifecycleStatus, StatusError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(StatusError::Regression { from: self, to: next })
        }
    }
}

crate::simple_display! {
    LifecycleStatus {
        Analyzing => "analyzing",
        InitializingSandbox => "init",
        GeneratingBacktrace => "backtrace",
        CleaningUpSandbox => "cleanup",
        SavingStatistics => "stats",
        Finishing => "finishing",
        Success => "success",
        Fail => "fail",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

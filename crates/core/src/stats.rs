// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completed-task statistics record.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// Metrics of one completed retrace. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashStatsRecord {
    pub task_id: TaskId,
    pub package: String,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Unix seconds when the worker started.
    pub start_time: i64,
    /// Wall-clock seconds the retrace took.
    pub duration: i64,
    /// Workers running when this task started.
    pub pre_running: i64,
    /// Workers running when this task finished.
    pub post_running: i64,
    /// Size of the sandbox root in bytes.
    pub chroot_size: i64,
}

crate::builder! {
    pub struct CrashStatsRecordBuilder => CrashStatsRecord {
        into {
            package: String = "bash",
            version: String = "4.1.2",
            release: String = "9.fc14",
            arch: String = "x86_64",
        }
        set {
            task_id: TaskId = TaskId(123456789),
            start_time: i64 = 1_700_000_000,
            duration: i64 = 42,
            pre_running: i64 = 0,
            post_running: i64 = 0,
            chroot_size: i64 = 0,
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! retrace-core: domain types and tool contracts for the retrace service

pub mod macros;

pub mod archive;
pub mod clock;
pub mod command;
pub mod config;
pub mod package;
pub mod probe;
pub mod process;
pub mod stats;
pub mod status;
pub mod task;

pub use archive::{ArchiveFormat, UnsupportedFormatError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use command::ToolCommand;
pub use config::{Config, ConfigError, DEFAULT_CONFIG_PATH};
pub use package::Nvra;
pub use process::{ProcessRecord, ProcessSnapshot, RunningWorker};
#[cfg(any(test, feature = "test-support"))]
pub use stats::CrashStatsRecordBuilder;
pub use stats::CrashStatsRecord;
pub use status::{LifecycleStatus, StatusError};
pub use task::{CrashFile, OsTaskIds, TaskId, TaskIdSource, TaskLayout};

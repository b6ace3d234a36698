// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time process table and process-tree queries.
//!
//! One snapshot is captured per reaper pass and reused for every tree query,
//! so all decisions in a pass see the same table.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::command::{ToolCommand, PS_BIN};
use crate::task::TaskId;

/// Executable name a worker process runs as.
pub const WORKER_BIN: &str = "retrace";

/// Subcommand that marks a process as a retrace worker: `retrace ... worker <taskid>`.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// `pid ppid etime user command...`
#[allow(clippy::expect_used)]
static PS_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*([0-9]+)[ \t]+([0-9]+)[ \t]+([0-9:-]+)[ \t]+([^ \t]+)[ \t]+(.*)$")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static WORKER_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:[^ \t]*/)?{WORKER_BIN}(?:[ \t].*)?[ \t]{WORKER_SUBCOMMAND}[ \t]+([0-9]+)[ \t]*$"))
        .expect("constant regex pattern is valid")
});

/// Process table listing with the columns [`ProcessSnapshot::parse`] expects.
pub fn ps_command() -> ToolCommand {
    ToolCommand::new(PS_BIN).args(["-eo", "pid,ppid,etime,user,args"])
}

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub elapsed: Duration,
    pub user: String,
    pub command: String,
}

impl ProcessRecord {
    /// Parse one `ps` row; `None` for headers and malformed lines.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = PS_ROW.captures(line)?;
        Some(Self {
            pid: caps.get(1)?.as_str().parse().ok()?,
            ppid: caps.get(2)?.as_str().parse().ok()?,
            elapsed: parse_etime(caps.get(3)?.as_str())?,
            user: caps.get(4)?.as_str().to_string(),
            command: caps.get(5)?.as_str().trim_end().to_string(),
        })
    }
}

/// A worker process found in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningWorker {
    pub pid: u32,
    pub task_id: TaskId,
    pub user: String,
    pub elapsed: Duration,
}

/// Ordered process table with a parent → children index built once.
#[derive(Debug, Clone, Default)]
pub struct ProcessSnapshot {
    records: Vec<ProcessRecord>,
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessSnapshot {
    pub fn from_records(records: Vec<ProcessRecord>) -> Self {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for record in &records {
            children.entry(record.ppid).or_default().push(record.pid);
        }
        Self { records, children }
    }

    /// Build a snapshot from raw `ps` output, skipping lines that do not parse.
    pub fn parse(output: &str) -> Self {
        Self::from_records(output.lines().filter_map(ProcessRecord::parse).collect())
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Processes running `retrace ... worker <taskid>`.
    pub fn running_workers(&self) -> Vec<RunningWorker> {
        self.records
            .iter()
            .filter_map(|r| {
                let caps = WORKER_ARGS.captures(&r.command)?;
                let task_id = caps.get(1)?.as_str().parse().ok()?;
                Some(RunningWorker {
                    pid: r.pid,
                    task_id: TaskId(task_id),
                    user: r.user.clone(),
                    elapsed: r.elapsed,
                })
            })
            .collect()
    }

    /// `pid` and every process whose parent chain reaches it.
    ///
    /// Each pid appears once, parents before children; `pid` is always
    /// first even if it is absent from the table.
    pub fn descendants_of(&self, pid: u32) -> Vec<u32> {
        let mut visited = HashSet::from([pid]);
        let mut order = vec![pid];
        let mut next = 0;
        while let Some(&current) = order.get(next) {
            next += 1;
            for &child in self.children.get(&current).map(Vec::as_slice).unwrap_or_default() {
                if visited.insert(child) {
                    order.push(child);
                }
            }
        }
        order
    }
}

/// Parse `ps` elapsed time: `[[dd-]hh:]mm:ss`.
pub fn parse_etime(etime: &str) -> Option<Duration> {
    let (days, clock) = match etime.split_once('-') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, etime),
    };
    let parts = clock.split(':').map(|p| p.parse::<u64>().ok()).collect::<Option<Vec<_>>>()?;
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };
    let secs = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?;
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;

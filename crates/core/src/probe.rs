// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disk measurement commands and their output parsers.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::command::{ToolCommand, DF_BIN, DU_BIN};

/// `df -B 1` row: filesystem, size, used, available, use%, mountpoint.
#[allow(clippy::expect_used)]
static DF_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^ \t]*)[ \t]+([0-9]+)[ \t]+([0-9]+)[ \t]+([0-9]+)[ \t]+([0-9]+%)[ \t]+(.*)$")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static DU_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)").expect("constant regex pattern is valid"));

pub fn free_space_command(path: &Path) -> ToolCommand {
    ToolCommand::new(DF_BIN).args(["-B", "1"]).arg(path)
}

pub fn dir_size_command(path: &Path) -> ToolCommand {
    ToolCommand::new(DU_BIN).arg("-sb").arg(path)
}

/// Available bytes on the filesystem mounted closest above `path`.
///
/// Rows whose mountpoint is not an ancestor of `path` are ignored; `None`
/// when no row matches.
pub fn parse_free_space(output: &str, path: &Path) -> Option<u64> {
    output
        .lines()
        .filter_map(|line| {
            let caps = DF_ROW.captures(line)?;
            let mountpoint = Path::new(caps.get(6)?.as_str().trim_end());
            if !path.starts_with(mountpoint) {
                return None;
            }
            let available: u64 = caps.get(4)?.as_str().parse().ok()?;
            Some((mountpoint.components().count(), available))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, available)| available)
}

/// Leading byte count of `du -sb` output; 0 when nothing parses.
pub fn parse_dir_size(output: &str) -> u64 {
    output
        .lines()
        .find_map(|line| DU_ROW.captures(line).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok()))
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;

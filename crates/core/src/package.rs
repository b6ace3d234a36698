// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package identification: `name-version-release.arch` and `file` output.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::command::{ToolCommand, FILE_BIN};

#[allow(clippy::expect_used)]
static NVRA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)-([0-9][^-]*)-([0-9][^-]*)\.([^.-]+)$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-._+]+$").expect("constant regex pattern is valid"));

/// Parsed `name-version-release.arch`.
///
/// The release keeps its distribution suffix (`9.fc14`); the arch is the
/// last dot-separated component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nvra {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nvra {
    pub fn parse(package: &str) -> Option<Self> {
        let caps = NVRA.captures(package.trim())?;
        Some(Self {
            name: caps.get(1)?.as_str().to_string(),
            version: caps.get(2)?.as_str().to_string(),
            release: caps.get(3)?.as_str().to_string(),
            arch: caps.get(4)?.as_str().to_string(),
        })
    }
}

/// Characters allowed by the Fedora naming guidelines.
pub fn is_valid_package_name(package: &str) -> bool {
    PACKAGE_NAME.is_match(package)
}

pub fn file_type_command(path: &std::path::Path) -> ToolCommand {
    ToolCommand::new(FILE_BIN).arg(path)
}

/// Architecture of a coredump from `file` output.
pub fn guess_arch(file_output: &str) -> Option<&'static str> {
    if file_output.contains("x86-64") {
        Some("x86_64")
    } else if file_output.contains("80386") {
        Some("i386")
    } else {
        None
    }
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;

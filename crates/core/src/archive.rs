// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive content types and their tool contracts.
//!
//! Each supported content type maps to an unpack command, a size-listing
//! command, and the pattern that finds the uncompressed size in the listing.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::command::{ToolCommand, GZIP_BIN, LS_BIN, TAR_BIN, XZ_BIN};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported archive content type: {0}")]
pub struct UnsupportedFormatError(pub String);

/// `xz --list --robot`: `totals <streams> <blocks> <compressed> <uncompressed> ...`
#[allow(clippy::expect_used)]
static XZ_TOTALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^totals[ \t]+[0-9]+[ \t]+[0-9]+[ \t]+[0-9]+[ \t]+([0-9]+)")
        .expect("constant regex pattern is valid")
});

/// `gzip --list`: first number is compressed size, second is uncompressed.
#[allow(clippy::expect_used)]
static GZIP_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^0-9]*[0-9]+[^0-9]+([0-9]+)").expect("constant regex pattern is valid")
});

/// `ls -l`: fifth field is the file size.
#[allow(clippy::expect_used)]
static LS_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*[^ \t]+[ \t]+[^ \t]+[ \t]+[^ \t]+[ \t]+[^ \t]+[ \t]+([0-9]+)")
        .expect("constant regex pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    XzTar,
    GzipTar,
    Tar,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 3] = [ArchiveFormat::XzTar, ArchiveFormat::GzipTar, ArchiveFormat::Tar];

    pub fn from_content_type(content_type: &str) -> Result<Self, UnsupportedFormatError> {
        Self::ALL
            .into_iter()
            .find(|f| f.content_type() == content_type.trim())
            .ok_or_else(|| UnsupportedFormatError(content_type.to_string()))
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArchiveFormat::XzTar => "application/x-xz-compressed-tar",
            ArchiveFormat::GzipTar => "application/x-gzip",
            ArchiveFormat::Tar => "application/x-tar",
        }
    }

    /// Command extracting `archive` into the command's working directory.
    pub fn unpack_command(self, archive: &Path) -> ToolCommand {
        let flags = match self {
            ArchiveFormat::XzTar => "xJf",
            ArchiveFormat::GzipTar => "xzf",
            ArchiveFormat::Tar => "xf",
        };
        ToolCommand::new(TAR_BIN).arg(flags).arg(archive)
    }

    /// Command listing the archive in a form [`Self::parse_unpacked_size`] understands.
    pub fn size_command(self, archive: &Path) -> ToolCommand {
        let cmd = match self {
            ArchiveFormat::XzTar => ToolCommand::new(XZ_BIN).args(["--list", "--robot"]),
            ArchiveFormat::GzipTar => ToolCommand::new(GZIP_BIN).arg("--list"),
            ArchiveFormat::Tar => ToolCommand::new(LS_BIN).arg("-l"),
        };
        cmd.arg(archive)
    }

    /// Uncompressed size from the first matching listing line, if any.
    pub fn parse_unpacked_size(self, listing: &str) -> Option<u64> {
        let pattern: &Regex = match self {
            ArchiveFormat::XzTar => &XZ_TOTALS,
            ArchiveFormat::GzipTar => &GZIP_LIST,
            ArchiveFormat::Tar => &LS_LONG,
        };
        listing.lines().find_map(|line| {
            pattern.captures(line).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
        })
    }
}

crate::simple_display! {
    ArchiveFormat {
        XzTar => "xz-compressed tar",
        GzipTar => "gzip tar",
        Tar => "tar",
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;

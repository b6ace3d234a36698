// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_fails() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn help_lists_commands() {
    cli().args(&["--help"]).passes().stdout_has("task").stdout_has("worker").stdout_has("gc").stdout_has("stats");
}

#[test]
fn task_help_lists_subcommands() {
    cli().args(&["task", "--help"]).passes().stdout_has("create").stdout_has("list").stdout_has("status");
}

#[test]
fn task_create_help_documents_content_type() {
    cli().args(&["task", "create", "--help"]).passes().stdout_has("--type").stdout_has("--start");
}

#[test]
fn version_shows_crate_version() {
    cli().args(&["--version"]).passes().stdout_has("retrace 0.2.0 (");
}

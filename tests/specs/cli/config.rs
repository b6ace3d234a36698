// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config file resolution and validation.

use crate::prelude::*;

#[test]
fn malformed_config_is_reported() {
    let root = ServiceRoot::new();
    root.file("retrace.toml", "[retrace\nSaveDir = ");
    cli().root(&root).args(&["stats", "init"]).fails_with(1).stderr_has("invalid config");
}

#[test]
fn unknown_option_is_reported() {
    let root = ServiceRoot::with_options("MaxParalelTasks = 4");
    cli().root(&root).args(&["stats", "init"]).fails_with(1).stderr_has("MaxParalelTasks");
}

#[test]
fn out_of_range_task_id_length_is_reported() {
    let root = ServiceRoot::with_options("TaskIdLength = 0");
    cli().root(&root).args(&["task", "list"]).fails_with(1).stderr_has("TaskIdLength");
}

#[test]
fn config_is_read_from_environment() {
    let root = ServiceRoot::new();
    let config = root.config_path();
    cli().env("RETRACE_CONFIG", &config).args(&["stats", "init"]).passes().stdout_has(&format!(
        "Statistics database ready at {}",
        root.spool().join("stats.db").display()
    ));
}

#[test]
fn service_log_goes_to_log_dir() {
    let root = ServiceRoot::new();
    cli().root(&root).env("RETRACE_LOG", "debug").args(&["stats", "init"]).passes();
    let logs: Vec<_> = std::fs::read_dir(root.path().join("log")).unwrap().flatten().collect();
    assert!(logs.iter().any(|e| e.file_name().to_string_lossy().starts_with("retrace.log")));
}

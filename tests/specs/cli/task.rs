// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `retrace task` and `retrace worker` on prepared task directories.

use crate::prelude::*;

#[test]
fn status_of_unknown_task_is_not_found() {
    let root = ServiceRoot::new();
    cli().root(&root).args(&["task", "status", "123456789"]).fails_with(4).stderr_has("task 123456789 not found");
}

#[test]
fn status_shows_the_persisted_phase() {
    let root = ServiceRoot::new();
    root.task("123456789", "secret", Some(2));
    cli()
        .root(&root)
        .args(&["task", "status", "123456789"])
        .passes()
        .stdout_has("123456789 [backtrace] Generating backtrace");
}

#[test]
fn status_with_wrong_password_is_not_found() {
    let root = ServiceRoot::new();
    root.task("123456789", "secret", None);
    cli().root(&root).args(&["task", "status", "123456789", "--password", "guess"]).fails_with(4);
    cli()
        .root(&root)
        .args(&["task", "status", "123456789", "--password", "secret"])
        .passes()
        .stdout_has("Waiting for a worker");
}

#[test]
fn status_as_json() {
    let root = ServiceRoot::new();
    root.task("123456789", "secret", Some(6));
    let run = cli().root(&root).args(&["task", "status", "123456789", "-o", "json"]).passes();
    let json = run.json();
    assert_eq!(json["id"], 123456789);
    assert_eq!(json["status"], "success");
    assert_eq!(json["description"], "Retrace job finished successfully");
}

#[test]
fn list_on_empty_root() {
    let root = ServiceRoot::new();
    cli().root(&root).args(&["task", "list"]).passes().stdout_has("No active tasks");
}

#[test]
fn list_skips_finished_and_foreign_entries() {
    let root = ServiceRoot::new();
    root.task("123456789", "secret", Some(1));
    let done = root.task("987654321", "secret", Some(6));
    std::fs::write(done.join("retrace_log"), "").unwrap();
    root.file("spool/notatask/password", "x");

    let run = cli().root(&root).args(&["task", "list", "-o", "json"]).passes();
    let rows = run.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 123456789);
    assert_eq!(rows[0]["status"], "initializing_sandbox");
}

#[test]
fn worker_for_unknown_task_fails() {
    let root = ServiceRoot::new();
    cli().root(&root).args(&["worker", "123456789"]).fails_with(1).stderr_has("task 123456789 does not exist");
}

#[test]
fn worker_for_finished_task_fails() {
    let root = ServiceRoot::new();
    let dir = root.task("123456789", "secret", Some(6));
    std::fs::write(dir.join("retrace_log"), "").unwrap();
    cli().root(&root).args(&["worker", "123456789"]).fails_with(1).stderr_has("has already finished");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `retrace gc` under the lock marker.

use crate::prelude::*;

#[test]
fn held_marker_skips_the_pass() {
    let root = ServiceRoot::new();
    root.file("spool/gc.lock", "");
    root.task("123456789", "secret", None);

    cli().root(&root).args(&["gc"]).passes().stdout_has("is held by another pass");

    assert!(root.spool().join("gc.lock").exists());
    assert!(!root.spool().join("123456789/retrace_log").exists());
}

#[test]
fn pinned_marker_shows_its_reason() {
    let root = ServiceRoot::new();
    root.file("spool/gc.lock", "disk replacement\n");
    cli().root(&root).args(&["gc"]).passes().stdout_has("is pinned: disk replacement");
}

#[test]
fn skipped_pass_as_json() {
    let root = ServiceRoot::new();
    root.file("spool/gc.lock", "");
    let run = cli().root(&root).args(&["gc", "-o", "json"]).passes();
    assert_eq!(run.json()["skipped"], true);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `retrace stats`

use crate::prelude::*;

#[test]
fn init_creates_the_database() {
    let root = ServiceRoot::new();
    cli().root(&root).args(&["stats", "init"]).passes().stdout_has("Statistics database ready");
    assert!(root.spool().join("stats.db").is_file());
}

#[test]
fn init_twice_is_harmless() {
    let root = ServiceRoot::new();
    cli().root(&root).args(&["stats", "init"]).passes();
    cli().root(&root).args(&["stats", "init"]).passes();
}

#[test]
fn show_on_a_fresh_database_is_empty() {
    let root = ServiceRoot::new();
    cli().root(&root).args(&["stats", "show"]).passes().stdout_has("No statistics recorded");
}

#[test]
fn show_as_json_is_an_array() {
    let root = ServiceRoot::new();
    let run = cli().root(&root).args(&["stats", "show", "-o", "json"]).passes();
    assert_eq!(run.json(), serde_json::json!([]));
}

#[test]
fn custom_database_file_name_is_used() {
    let root = ServiceRoot::with_options("DBFile = \"retrace-stats.db\"");
    cli().root(&root).args(&["stats", "init"]).passes().stdout_lacks("stats.db\n");
    assert!(root.spool().join("retrace-stats.db").is_file());
}

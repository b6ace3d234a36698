// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn flag_wins_over_environment() {
    std::env::set_var(CONFIG_VAR, "/from/env.toml");
    let path = config_path(Some(PathBuf::from("/from/flag.toml")));
    std::env::remove_var(CONFIG_VAR);
    assert_eq!(path, PathBuf::from("/from/flag.toml"));
}

#[test]
#[serial]
fn environment_wins_over_default() {
    std::env::set_var(CONFIG_VAR, "/from/env.toml");
    let path = config_path(None);
    std::env::remove_var(CONFIG_VAR);
    assert_eq!(path, PathBuf::from("/from/env.toml"));
}

#[test]
#[serial]
fn empty_environment_falls_back_to_default() {
    std::env::set_var(CONFIG_VAR, "");
    let path = config_path(None);
    std::env::remove_var(CONFIG_VAR);
    assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_PATH));
}

#[test]
#[serial]
fn log_filter_defaults_to_info() {
    std::env::remove_var(LOG_VAR);
    assert_eq!(log_filter(), "info");

    std::env::set_var(LOG_VAR, "retrace_engine=debug");
    assert_eq!(log_filter(), "retrace_engine=debug");
    std::env::remove_var(LOG_VAR);
}

#[test]
fn version_carries_git_hash() {
    assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
    assert!(VERSION.ends_with(')'));
}

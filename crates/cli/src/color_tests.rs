// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use retrace_core::LifecycleStatus;
use serial_test::serial;

fn force_color(on: bool) {
    if on {
        std::env::set_var("COLOR", "1");
        std::env::remove_var("NO_COLOR");
    } else {
        std::env::set_var("NO_COLOR", "1");
        std::env::remove_var("COLOR");
    }
}

#[test]
#[serial]
fn styles_are_plain_without_color() {
    force_color(false);
    assert_eq!(format!("{:?}", styles()), format!("{:?}", Styles::plain()));
}

#[test]
#[serial]
fn styles_are_styled_when_forced() {
    force_color(true);
    assert_ne!(format!("{:?}", styles()), format!("{:?}", Styles::plain()));
}

#[test]
#[serial]
fn header_wraps_text_in_ansi_when_forced() {
    force_color(true);
    let out = header("ID");
    assert!(out.starts_with("\x1b[38;5;74m"));
    assert!(out.ends_with("ID\x1b[0m"));
}

#[test]
#[serial]
fn text_is_untouched_without_color() {
    force_color(false);
    assert_eq!(header("ID"), "ID");
    assert_eq!(context("5m"), "5m");
    assert_eq!(status(LifecycleStatus::Fail, "fail"), "fail");
}

#[test]
#[serial]
fn only_terminal_phases_are_colored() {
    force_color(true);
    assert!(status(LifecycleStatus::Success, "success").contains("\x1b[38;5;108m"));
    assert!(status(LifecycleStatus::Fail, "fail").contains("\x1b[38;5;167m"));
    assert_eq!(status(LifecycleStatus::Analyzing, "analyzing"), "analyzing");
}

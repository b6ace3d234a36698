// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::subprocess::{CommandOutput, FakeRunner};
use std::path::PathBuf;

const DF_OUT: &str = "\
Filesystem       1B-blocks        Used   Available Use% Mounted on
/dev/sda3      52710469632 21178245120 28832526336  43% /var/spool
";

fn probe_with(runner: &FakeRunner) -> QuotaProbe {
    QuotaProbe::new(Arc::new(runner.clone()))
}

#[tokio::test]
async fn free_space_reads_available_column() {
    let runner = FakeRunner::new();
    runner.respond("df", CommandOutput::ok(DF_OUT));
    let free = probe_with(&runner).free_space(&PathBuf::from("/var/spool")).await;
    assert_eq!(free, Some(28_832_526_336));

    let call = &runner.calls_to("df")[0];
    assert_eq!(call.to_string(), "/bin/df -B 1 /var/spool");
}

#[tokio::test]
async fn free_space_is_unknown_without_a_row() {
    let runner = FakeRunner::new();
    runner.respond("df", CommandOutput::ok("Filesystem 1B-blocks Used Available Use% Mounted on\n"));
    assert_eq!(probe_with(&runner).free_space(Path::new("/srv")).await, None);
}

#[tokio::test]
async fn free_space_uses_the_row_for_the_paths_mount() {
    let runner = FakeRunner::new();
    runner.respond(
        "df",
        CommandOutput::ok(
            "Filesystem 1B-blocks Used Available Use% Mounted on\n\
             /dev/sda1 1000 100 900 10% /\n\
             /dev/sdb1 5000 1000 4000 20% /srv/retrace\n",
        ),
    );
    let free = probe_with(&runner).free_space(Path::new("/srv/retrace/spool")).await;
    assert_eq!(free, Some(4000));
}

#[tokio::test]
async fn free_space_is_unknown_when_df_is_missing() {
    let runner = FakeRunner::new();
    runner.missing("df");
    assert_eq!(probe_with(&runner).free_space(Path::new("/srv")).await, None);
}

#[tokio::test]
async fn dir_size_reads_leading_count() {
    let runner = FakeRunner::new();
    runner.respond("du", CommandOutput::ok("1048576\t/var/lib/mock/123456789\n"));
    assert_eq!(probe_with(&runner).dir_size(Path::new("/var/lib/mock/123456789")).await, 1_048_576);
}

#[yare::parameterized(
    empty_output = { "" },
    error_only   = { "du: cannot access '/nope': No such file or directory\n" },
)]
fn dir_size_defaults_to_zero(stdout: &str) {
    let runner = FakeRunner::new();
    runner.respond("du", CommandOutput::ok(stdout));
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    assert_eq!(rt.block_on(probe_with(&runner).dir_size(Path::new("/nope"))), 0);
}

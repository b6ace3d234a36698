// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::subprocess::CommandOutput;
use crate::test_support::{write_crash_files, Harness, BACKTRACE};
use std::time::Duration;

fn is_gdb(cmd: &retrace_core::ToolCommand) -> bool {
    cmd.args.iter().any(|a| a.to_string_lossy().contains("gdb -batch"))
}

async fn stats_rows(h: &Harness) -> Vec<CrashStatsRecord> {
    StatsStore::from_config(&h.config).records().await.unwrap_or_default()
}

#[tokio::test]
async fn gzip_upload_retraces_to_success() {
    let h = Harness::new(&[123456789]);
    let upload = h.upload(4096);
    let task = h.intake().create(&upload, "application/x-gzip").await.unwrap();
    h.runner.handle("mock", {
        let clock = h.clock.clone();
        move |cmd| {
            if is_gdb(cmd) {
                clock.advance(Duration::from_secs(42));
            }
            Ok(CommandOutput::ok(if is_gdb(cmd) { BACKTRACE } else { "" }))
        }
    });

    let outcome = h.worker().run(task.id).await.unwrap();

    assert!(outcome.succeeded(), "error: {:?}", outcome.error);
    let layout = h.store.layout(task.id);
    assert_eq!(h.store.status(task.id), Some(LifecycleStatus::Success));
    assert_eq!(fs::read_to_string(layout.backtrace()).unwrap(), BACKTRACE);
    assert!(!layout.crash_dir().exists());
    assert!(!layout.sandbox_config().exists());
    assert!(!layout.raw_log().exists());
    assert!(!h.store.is_active(task.id));

    let log = fs::read_to_string(layout.finalized_log()).unwrap();
    for status in LifecycleStatus::ALL.iter().filter(|s| **s != LifecycleStatus::Fail) {
        assert!(log.contains(status.description()), "log lacks {status}: {log}");
    }

    let rows = stats_rows(&h).await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row, outcome.stats.as_ref().unwrap());
    assert_eq!(row.task_id, task.id);
    assert_eq!((row.package.as_str(), row.version.as_str()), ("bash", "4.1.2"));
    assert_eq!((row.release.as_str(), row.arch.as_str()), ("9.fc14", "x86_64"));
    assert_eq!(row.duration, 42);
    assert_eq!(row.chroot_size, 734_003_200);
}

#[tokio::test]
async fn sandbox_steps_run_in_order() {
    let h = Harness::new(&[123456789]);
    let task = h.intake().create(&h.upload(64), "application/x-gzip").await.unwrap();
    h.worker().run(task.id).await.unwrap();

    let steps: Vec<String> = h
        .runner
        .calls_to("mock")
        .iter()
        .map(|c| c.args[2].to_string_lossy().into_owned())
        .collect();
    assert_eq!(steps, vec!["init", "--copyin", "shell", "shell", "--scrub=all"]);
}

#[tokio::test]
async fn coredump_arch_overrides_package_arch() {
    let h = Harness::new(&[123456789]);
    h.runner.respond("file", CommandOutput::ok("coredump: ELF 32-bit LSB core file Intel 80386\n"));
    let task = h.intake().create(&h.upload(64), "application/x-gzip").await.unwrap();

    let outcome = h.worker().run(task.id).await.unwrap();
    assert_eq!(outcome.stats.unwrap().arch, "i386");
    let cfg = fs::read_to_string(h.store.layout(task.id).sandbox_config());
    assert!(cfg.is_err(), "sandbox config is removed once finished");
}

#[tokio::test]
async fn empty_backtrace_fails_and_cleans_up() {
    let h = Harness::new(&[123456789]);
    let task = h.intake().create(&h.upload(64), "application/x-gzip").await.unwrap();
    h.runner.handle("mock", |_| Ok(CommandOutput::ok("")));

    let outcome = h.worker().run(task.id).await.unwrap();

    assert_eq!(outcome.status, LifecycleStatus::Fail);
    assert_eq!(outcome.error.as_deref(), Some("gdb produced no output"));
    let layout = h.store.layout(task.id);
    assert_eq!(h.store.status(task.id), Some(LifecycleStatus::Fail));
    assert!(!layout.crash_dir().exists());
    assert!(!layout.sandbox_config().exists());
    let log = fs::read_to_string(layout.finalized_log()).unwrap();
    assert!(log.contains("gdb produced no output"));
    assert!(!log.contains("Killed by garbage collector"));
    assert!(stats_rows(&h).await.is_empty());
}

#[tokio::test]
async fn sandbox_init_failure_fails_the_task() {
    let h = Harness::new(&[123456789]);
    let task = h.intake().create(&h.upload(64), "application/x-gzip").await.unwrap();
    h.runner.respond("mock", CommandOutput::failed(30, "mock: no such config"));

    let outcome = h.worker().run(task.id).await.unwrap();
    assert_eq!(outcome.status, LifecycleStatus::Fail);
    assert!(outcome.error.unwrap().contains("mock init exited with code 30"));
}

#[tokio::test]
async fn malformed_package_fails_in_analysis() {
    let h = Harness::new(&[123456789]);
    let id = h.store.allocate().unwrap().id;
    let layout = h.store.layout(id);
    fs::create_dir(layout.crash_dir()).unwrap();
    write_crash_files(&layout.crash_dir(), "bash; rm -rf /");

    let outcome = h.worker().run(id).await.unwrap();
    assert_eq!(outcome.status, LifecycleStatus::Fail);
    assert!(outcome.error.unwrap().starts_with("unrecognized package"));
    assert!(h.runner.calls_to("mock").is_empty());
}

#[tokio::test]
async fn missing_crash_files_fail_in_analysis() {
    let h = Harness::new(&[123456789]);
    let id = h.store.allocate().unwrap().id;

    let outcome = h.worker().run(id).await.unwrap();
    assert_eq!(outcome.error.as_deref(), Some("missing crash files: coredump, executable, package"));
    assert!(!h.store.is_active(id));
}

#[tokio::test]
async fn stats_failure_does_not_fail_the_task() {
    let h = Harness::new(&[123456789]);
    let task = h.intake().create(&h.upload(64), "application/x-gzip").await.unwrap();
    // a directory where the database file should be
    fs::create_dir_all(h.config.stats_db_path()).unwrap();

    let outcome = h.worker().run(task.id).await.unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.stats, None);
    let log = fs::read_to_string(h.store.layout(task.id).finalized_log()).unwrap();
    assert!(log.contains("failed to save statistics"));
}

#[tokio::test]
async fn unknown_and_finished_tasks_are_refused() {
    let h = Harness::new(&[123456789]);
    let worker = h.worker();
    assert!(matches!(worker.run(TaskId(987654321)).await, Err(WorkerError::NoSuchTask(_))));

    let id = h.store.allocate().unwrap().id;
    fs::write(h.store.layout(id).finalized_log(), "").unwrap();
    assert!(matches!(worker.run(id).await, Err(WorkerError::Finished(_))));
}

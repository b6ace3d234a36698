// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use retrace_core::{Config, FakeClock, ToolCommand};
use tempfile::TempDir;

use crate::admission::Admission;
use crate::archive::ArchiveCodec;
use crate::intake::TaskIntake;
use crate::quota::QuotaProbe;
use crate::subprocess::{CommandOutput, FakeRunner};
use crate::task_store::{FixedTaskIds, TaskStore};
use crate::worker::RetraceWorker;

pub const MB: u64 = 1024 * 1024;

pub const BACKTRACE: &str = "\
Core was generated by `/usr/bin/bash'.
Program terminated with signal 11, Segmentation fault.
#0  0x0000003a7e632945 in raise () from /lib64/libc.so.6
#1  0x0000003a7e634125 in abort () from /lib64/libc.so.6
";

pub fn df(available: u64) -> CommandOutput {
    CommandOutput::ok(format!(
        "Filesystem 1B-blocks Used Available Use% Mounted on\n/dev/sda1 100000000000 1 {available} 1% /\n"
    ))
}

pub fn gzip_listing(uncompressed: u64) -> CommandOutput {
    CommandOutput::ok(format!(
        "compressed uncompressed ratio uncompressed_name\n 2048 {uncompressed} 50.0% /tmp/upload.tar\n"
    ))
}

fn is_gdb(cmd: &ToolCommand) -> bool {
    cmd.args.iter().any(|a| a.to_string_lossy().contains("gdb -batch"))
}

/// A scratch service root with every tool faked to succeed.
pub struct Harness {
    pub dir: TempDir,
    pub config: Config,
    pub runner: FakeRunner,
    pub store: TaskStore,
    pub clock: FakeClock,
}

impl Harness {
    pub fn new(ids: &[u64]) -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let config = Config::rooted_at(dir.path());
        let runner = FakeRunner::new();
        runner.respond("df", df(50 * 1024 * MB));
        runner.respond("gzip", gzip_listing(100 * MB));
        runner.respond("file", CommandOutput::ok("coredump: ELF 64-bit LSB core file x86-64, version 1 (SYSV)\n"));
        runner.respond("du", CommandOutput::ok("734003200\t/var/lib/mock/retrace\n"));
        runner.respond("ps", CommandOutput::ok("  PID  PPID ELAPSED USER COMMAND\n"));
        runner.handle("tar", |cmd| {
            let cwd = cmd.cwd.clone().unwrap_or_default();
            write_crash_files(&cwd, "bash-4.1.2-9.fc14.x86_64");
            Ok(CommandOutput::ok(""))
        });
        runner.handle("mock", |cmd| Ok(CommandOutput::ok(if is_gdb(cmd) { BACKTRACE } else { "" })));
        let store = TaskStore::with_ids(&config, Arc::new(FixedTaskIds::new(ids.iter().copied())));
        Self { dir, config, runner, store, clock: FakeClock::new() }
    }

    /// An uploaded archive of `bytes` bytes.
    pub fn upload(&self, bytes: usize) -> PathBuf {
        let path = self.dir.path().join("upload.tar.gz");
        fs::write(&path, vec![0u8; bytes]).unwrap_or_else(|e| panic!("write upload: {e}"));
        path
    }

    pub fn intake(&self) -> TaskIntake {
        let runner = Arc::new(self.runner.clone());
        let admission = Admission::new(&self.config, QuotaProbe::new(runner.clone()), ArchiveCodec::new(runner.clone()));
        TaskIntake::new(admission, ArchiveCodec::new(runner), self.store.clone())
    }

    pub fn worker(&self) -> RetraceWorker<FakeClock> {
        RetraceWorker::new(&self.config, Arc::new(self.runner.clone()), self.store.clone(), self.clock.clone())
    }
}

pub fn write_crash_files(dir: &std::path::Path, package: &str) {
    let files = [("coredump", "\x7fELF core"), ("executable", "/usr/bin/bash"), ("package", package)];
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap_or_else(|e| panic!("write {name}: {e}"));
    }
}

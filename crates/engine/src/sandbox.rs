// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock sandbox driver: configuration, setup, gdb run, and scrub.
//!
//! Host-side invocations are argument vectors. `mock shell` joins whatever
//! follows `--` and hands it to `/bin/sh`, so commands run inside the
//! sandbox are passed as one string with every word shell-quoted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use retrace_core::command::MOCK_BIN;
use retrace_core::package::is_valid_package_name;
use retrace_core::{Config, CrashFile, TaskLayout, ToolCommand};
use thiserror::Error;

use crate::subprocess::{CommandRunner, SubprocessError, SANDBOX_TIMEOUT};

/// Where mock keeps its roots.
pub const MOCK_ROOT_DIR: &str = "/var/lib/mock";

/// Crash directory location inside the sandbox.
pub const SANDBOX_CRASH_DIR: &str = "/var/spool/abrt/crash";

/// Unprivileged user gdb runs as inside the sandbox.
const SANDBOX_USER: &str = "mockbuild";

/// Packages every sandbox gets on top of the crashed one.
const BASE_PACKAGES: &str = "bash coreutils cpio gdb shadow-utils util-linux";

/// gdb commands run against the coredump, in order.
const GDB_SCRIPT: [&str; 6] = [
    "thread apply all backtrace 2048 full",
    "info sharedlib",
    "print (char*)__abort_msg",
    "print (char*)__glib_assert_msg",
    "info registers",
    "disassemble",
];

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("refusing to install invalid package name {0:?}")]
    InvalidPackage(String),

    #[error("failed to write sandbox config {0}: {1}")]
    Config(PathBuf, #[source] std::io::Error),

    #[error("mock {step} exited with code {code}: {stderr}")]
    Failed { step: &'static str, code: i32, stderr: String },

    #[error("cannot quote {0:?} for the sandbox shell")]
    Quote(String),

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// What to install into a task's sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxSpec {
    /// Full package string as uploaded, e.g. `bash-4.1.2-9.fc14.x86_64`.
    pub package: String,
    pub arch: String,
}

#[derive(Clone)]
pub struct SandboxRunner {
    runner: Arc<dyn CommandRunner>,
    repo_dir: PathBuf,
}

impl SandboxRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Self {
        Self { runner, repo_dir: config.repo_dir.clone() }
    }

    /// Name of the mock root for a task.
    pub fn root_name(layout: &TaskLayout) -> String {
        format!("retrace-{}", layout.id())
    }

    /// Host directory holding the task's sandbox root.
    pub fn root_dir(layout: &TaskLayout) -> PathBuf {
        Path::new(MOCK_ROOT_DIR).join(Self::root_name(layout))
    }

    /// Write `mock.cfg` for the task.
    pub fn write_config(&self, layout: &TaskLayout, spec: &SandboxSpec) -> Result<(), SandboxError> {
        if !is_valid_package_name(&spec.package) {
            return Err(SandboxError::InvalidPackage(spec.package.clone()));
        }
        if !is_valid_package_name(&spec.arch) {
            return Err(SandboxError::InvalidPackage(spec.arch.clone()));
        }
        let path = layout.sandbox_config();
        fs::write(&path, self.render_config(layout, spec)).map_err(|e| SandboxError::Config(path, e))
    }

    fn render_config(&self, layout: &TaskLayout, spec: &SandboxSpec) -> String {
        let root = Self::root_name(layout);
        let repo = self.repo_dir.join(&spec.arch);
        format!(
            "config_opts['root'] = '{root}'\n\
             config_opts['target_arch'] = '{arch}'\n\
             config_opts['chroot_setup_cmd'] = 'install {BASE_PACKAGES} {package}'\n\
             config_opts['plugin_conf']['ccache_enable'] = False\n\
             config_opts['plugin_conf']['yum_cache_enable'] = False\n\
             config_opts['plugin_conf']['root_cache_enable'] = False\n\
             config_opts['yum.conf'] = \"\"\"\n\
             [main]\n\
             cachedir=/var/cache/yum\n\
             debuglevel=1\n\
             reposdir=/dev/null\n\
             retries=20\n\
             obsoletes=1\n\
             gpgcheck=0\n\
             assumeyes=1\n\
             \n\
             [retrace]\n\
             name={arch} packages\n\
             baseurl=file://{repo}/\n\
             \"\"\"\n",
            arch = spec.arch,
            package = spec.package,
            repo = repo.display(),
        )
    }

    fn mock(layout: &TaskLayout) -> ToolCommand {
        ToolCommand::new(MOCK_BIN).arg("-r").arg(layout.sandbox_config())
    }

    /// Build the sandbox root.
    pub async fn init(&self, layout: &TaskLayout) -> Result<(), SandboxError> {
        self.run_step("init", Self::mock(layout).arg("init")).await
    }

    /// Copy the task's crash directory into the sandbox.
    pub async fn copy_in(&self, layout: &TaskLayout) -> Result<(), SandboxError> {
        let cmd = Self::mock(layout).arg("--copyin").arg(layout.crash_dir()).arg(SANDBOX_CRASH_DIR);
        self.run_step("copyin", cmd).await
    }

    /// Tear down the sandbox root.
    pub async fn scrub(&self, layout: &TaskLayout) -> Result<(), SandboxError> {
        self.run_step("scrub", Self::mock(layout).arg("--scrub=all")).await
    }

    async fn run_step(&self, step: &'static str, cmd: ToolCommand) -> Result<(), SandboxError> {
        tracing::debug!(step, command = %cmd, "running mock");
        let output = self.runner.run(&cmd, SANDBOX_TIMEOUT).await?;
        if output.success() {
            Ok(())
        } else {
            Err(SandboxError::Failed { step, code: output.exit_code(), stderr: output.stderr.trim().to_string() })
        }
    }

    /// Run gdb against the task's coredump and return everything it printed.
    ///
    /// Returns an empty string on any failure; callers treat empty output
    /// as a failed retrace.
    pub async fn run_backtrace(&self, layout: &TaskLayout) -> String {
        let Some(executable) = read_executable(&layout.crash_file(CrashFile::Executable)) else {
            tracing::warn!(task_id = %layout.id(), "executable path missing or unreadable");
            return String::new();
        };

        let chmod = match Self::shell(layout, ["/bin/chmod", "777", executable.as_str()]) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::warn!(task_id = %layout.id(), error = %e, "unusable executable path");
                return String::new();
            }
        };
        match self.runner.run(&chmod, SANDBOX_TIMEOUT).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                tracing::warn!(task_id = %layout.id(), code = output.exit_code(), "chmod in sandbox failed");
                return String::new();
            }
            Err(e) => {
                tracing::warn!(task_id = %layout.id(), error = %e, "chmod in sandbox failed");
                return String::new();
            }
        }

        let gdb = match Self::gdb_command(layout, &executable) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::warn!(task_id = %layout.id(), error = %e, "unusable executable path");
                return String::new();
            }
        };
        match self.runner.run(&gdb, SANDBOX_TIMEOUT).await {
            Ok(output) => output.combined(),
            Err(e) => {
                tracing::warn!(task_id = %layout.id(), error = %e, "gdb in sandbox failed");
                String::new()
            }
        }
    }

    /// `mock shell -- '<words>'` with every word quoted for `/bin/sh`.
    fn shell<'a>(layout: &TaskLayout, words: impl IntoIterator<Item = &'a str>) -> Result<ToolCommand, SandboxError> {
        let words: Vec<&str> = words.into_iter().collect();
        let line = shlex::try_join(words.iter().copied()).map_err(|_| SandboxError::Quote(words.join(" ")))?;
        Ok(Self::mock(layout).args(["shell", "--"]).arg(line))
    }

    fn gdb_command(layout: &TaskLayout, executable: &str) -> Result<ToolCommand, SandboxError> {
        let file = format!("file {executable}");
        let core = format!("core-file {SANDBOX_CRASH_DIR}/{}", CrashFile::Coredump);
        let mut words = vec!["runuser", "-u", SANDBOX_USER, "--", "gdb", "-batch"];
        words.extend(["-ex", file.as_str(), "-ex", core.as_str()]);
        for command in GDB_SCRIPT {
            words.extend(["-ex", command]);
        }
        Self::shell(layout, words)
    }
}

/// Executable path from the task's `executable` file, quotes removed.
fn read_executable(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let executable: String = text.trim().chars().filter(|c| *c != '\'' && *c != '"').collect();
    (!executable.is_empty()).then_some(executable)
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;

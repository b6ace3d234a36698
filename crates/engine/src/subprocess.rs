// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External tool execution with timeouts.
//!
//! Every tool the service drives goes through [`CommandRunner`], so tests can
//! substitute canned output for `df`, `tar`, `ps`, `mock` and friends.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use retrace_core::ToolCommand;
use thiserror::Error;

/// Timeout for quick probes (`df`, `du`, `ps`, `file`, size listings).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for archive extraction.
pub const UNPACK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Timeout for sandbox operations (init, copy-in, gdb, scrub).
pub const SANDBOX_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{label}: failed to spawn: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label}: failed to collect output: {source}")]
    Wait {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} timed out after {}s", timeout.as_secs())]
    TimedOut { label: String, timeout: Duration },
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { code: Some(0), stdout: stdout.into(), stderr: String::new() }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self { code: Some(code), stdout: String::new(), stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code with signal deaths folded to -1.
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs external tools described as argument vectors.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &ToolCommand, timeout: Duration) -> Result<CommandOutput, SubprocessError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand, timeout: Duration) -> Result<CommandOutput, SubprocessError> {
        let mut command = tokio::process::Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }
        run_with_timeout(command, timeout, &cmd.label()).await
    }
}

/// Run a command to completion, killing it if `timeout` elapses first.
pub async fn run_with_timeout(
    mut cmd: tokio::process::Command,
    timeout: Duration,
    label: &str,
) -> Result<CommandOutput, SubprocessError> {
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
    let child = cmd
        .spawn()
        .map_err(|source| SubprocessError::Spawn { label: label.to_string(), source })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output.into()),
        Ok(Err(source)) => Err(SubprocessError::Wait { label: label.to_string(), source }),
        Err(_) => {
            tracing::warn!(label, timeout_secs = timeout.as_secs(), "command timed out");
            Err(SubprocessError::TimedOut { label: label.to_string(), timeout })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{CommandOutput, CommandRunner, SubprocessError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use retrace_core::ToolCommand;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    type Handler = Arc<dyn Fn(&ToolCommand) -> Result<CommandOutput, SubprocessError> + Send + Sync>;

    #[derive(Default)]
    struct FakeRunnerState {
        handlers: HashMap<String, Handler>,
        calls: Vec<ToolCommand>,
    }

    /// Fake command runner keyed by program label (`df`, `tar`, `mock`, ...).
    ///
    /// Unconfigured programs succeed with empty output.
    #[derive(Clone, Default)]
    pub struct FakeRunner {
        inner: Arc<Mutex<FakeRunnerState>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Return `output` for every call to `label`.
        pub fn respond(&self, label: &str, output: CommandOutput) {
            self.handle(label, move |_| Ok(output.clone()));
        }

        /// Fail every call to `label` as if the program were missing.
        pub fn missing(&self, label: &str) {
            let name = label.to_string();
            self.handle(label, move |_| {
                Err(SubprocessError::Spawn {
                    label: name.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            });
        }

        /// Compute the result of calls to `label` from the command itself.
        pub fn handle<F>(&self, label: &str, handler: F)
        where
            F: Fn(&ToolCommand) -> Result<CommandOutput, SubprocessError> + Send + Sync + 'static,
        {
            self.inner.lock().handlers.insert(label.to_string(), Arc::new(handler));
        }

        /// Every command run so far, in order.
        pub fn calls(&self) -> Vec<ToolCommand> {
            self.inner.lock().calls.clone()
        }

        pub fn calls_to(&self, label: &str) -> Vec<ToolCommand> {
            self.calls().into_iter().filter(|c| c.label() == label).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, cmd: &ToolCommand, _timeout: Duration) -> Result<CommandOutput, SubprocessError> {
            let handler = {
                let mut state = self.inner.lock();
                state.calls.push(cmd.clone());
                state.handlers.get(&cmd.label()).cloned()
            };
            match handler {
                Some(handler) => handler(cmd),
                None => Ok(CommandOutput::ok("")),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRunner;

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service configuration.
//!
//! Loaded once at process start from the `[retrace]` table of a TOML file and
//! passed by reference to every component. Missing keys keep their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/retrace-server.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Immutable service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct Config {
    /// Number of decimal digits in a task ID.
    pub task_id_length: usize,
    /// Length of the generated task password.
    pub task_pass_length: usize,
    pub max_parallel_tasks: usize,
    /// Maximum packed archive size in MB.
    pub max_packed_size: u64,
    /// Maximum estimated unpacked size in MB.
    pub max_unpacked_size: u64,
    /// Minimum free storage in KB required to accept an upload.
    pub min_storage_left: u64,
    /// Minutes after which a task is garbage-collected.
    pub delete_task_after: u64,
    /// Minutes a task may exist without a worker before it counts as orphaned.
    pub orphan_grace: u64,
    pub log_dir: PathBuf,
    pub repo_dir: PathBuf,
    pub save_dir: PathBuf,
    pub work_dir: PathBuf,
    pub use_work_dir: bool,
    #[serde(rename = "DBFile")]
    pub db_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            task_id_length: 9,
            task_pass_length: 32,
            max_parallel_tasks: 10,
            max_packed_size: 30,
            max_unpacked_size: 600,
            min_storage_left: 10240,
            delete_task_after: 120,
            orphan_grace: 5,
            log_dir: PathBuf::from("/var/log/retrace-server"),
            repo_dir: PathBuf::from("/var/cache/retrace-server"),
            save_dir: PathBuf::from("/var/spool/retrace-server"),
            work_dir: PathBuf::from("/tmp/retrace-server"),
            use_work_dir: false,
            db_file: "stats.db".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    retrace: Config,
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Read(path.to_path_buf(), e)),
        };
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse(_, source) => ConfigError::Parse(path.to_path_buf(), source),
            other => other,
        })?;
        Ok(config)
    }

    /// Parse a TOML document containing a `[retrace]` table.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        file.retrace.validate()?;
        Ok(file.retrace)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // 10^19 overflows u64
        if self.task_id_length == 0 || self.task_id_length > 18 {
            return Err(ConfigError::Invalid {
                key: "TaskIdLength",
                reason: format!("{} is outside 1..=18", self.task_id_length),
            });
        }
        if self.task_pass_length == 0 {
            return Err(ConfigError::Invalid {
                key: "TaskPassLength",
                reason: "must be positive".to_string(),
            });
        }
        if self.db_file.is_empty() {
            return Err(ConfigError::Invalid { key: "DBFile", reason: "must not be empty".into() });
        }
        Ok(())
    }

    pub fn max_packed_bytes(&self) -> u64 {
        self.max_packed_size.saturating_mul(1024 * 1024)
    }

    pub fn max_unpacked_bytes(&self) -> u64 {
        self.max_unpacked_size.saturating_mul(1024 * 1024)
    }

    pub fn min_storage_bytes(&self) -> u64 {
        self.min_storage_left.saturating_mul(1024)
    }

    pub fn delete_task_after(&self) -> Duration {
        Duration::from_secs(self.delete_task_after.saturating_mul(60))
    }

    pub fn orphan_grace(&self) -> Duration {
        Duration::from_secs(self.orphan_grace.saturating_mul(60))
    }

    /// Directory holding the per-task directories.
    pub fn task_root(&self) -> &Path {
        if self.use_work_dir {
            &self.work_dir
        } else {
            &self.save_dir
        }
    }

    pub fn stats_db_path(&self) -> PathBuf {
        self.save_dir.join(&self.db_file)
    }

    /// Configuration rooted in a scratch directory, for tests.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            log_dir: root.join("log"),
            repo_dir: root.join("repo"),
            save_dir: root.join("spool"),
            work_dir: root.join("work"),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only SQLite table of completed-task statistics.
//!
//! Every call opens its own connection, runs in one transaction, and closes
//! the connection again. Nothing is held between calls, so concurrent workers
//! only contend for the SQLite file lock for the length of one statement; a
//! write that loses that race is reported and dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use retrace_core::{Config, CrashStatsRecord, TaskId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Row};
use thiserror::Error;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS
retracestats(
  taskid INT NOT NULL,
  package VARCHAR(255) NOT NULL,
  version VARCHAR(16) NOT NULL,
  release VARCHAR(16) NOT NULL,
  arch VARCHAR(8) NOT NULL,
  starttime INT NOT NULL,
  duration INT NOT NULL,
  prerunning TINYINT NOT NULL,
  postrunning TINYINT NOT NULL,
  chrootsize BIGINT NOT NULL
)
"#;

const INSERT_ROW: &str = r#"
INSERT INTO retracestats(taskid, package, version, release, arch,
  starttime, duration, prerunning, postrunning, chrootsize)
VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_ROWS: &str = r#"
SELECT taskid, package, version, release, arch,
  starttime, duration, prerunning, postrunning, chrootsize
FROM retracestats
ORDER BY starttime, taskid
"#;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open stats database {0}: {1}")]
    Open(PathBuf, #[source] sqlx::Error),

    #[error("stats query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("task id {0} does not fit the stats schema")]
    TaskIdOutOfRange(TaskId),
}

/// Handle to the stats database file. Cheap to clone; holds no connection.
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.stats_db_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection, StorageError> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT)
            .connect()
            .await
            .map_err(|e| StorageError::Open(self.path.clone(), e))
    }

    /// Create the `retracestats` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    /// Append one record.
    pub async fn insert(&self, record: &CrashStatsRecord) -> Result<(), StorageError> {
        let task_id = i64::try_from(record.task_id.as_u64())
            .map_err(|_| StorageError::TaskIdOutOfRange(record.task_id))?;

        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;
        sqlx::query(INSERT_ROW)
            .bind(task_id)
            .bind(&record.package)
            .bind(&record.version)
            .bind(&record.release)
            .bind(&record.arch)
            .bind(record.start_time)
            .bind(record.duration)
            .bind(record.pre_running)
            .bind(record.post_running)
            .bind(record.chroot_size)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        conn.close().await?;

        tracing::debug!(task_id = %record.task_id, package = %record.package, "saved crash statistics");
        Ok(())
    }

    /// All records, oldest first.
    pub async fn records(&self) -> Result<Vec<CrashStatsRecord>, StorageError> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(SELECT_ROWS).fetch_all(&mut conn).await?;
        conn.close().await?;

        rows.iter()
            .map(|row| -> Result<CrashStatsRecord, StorageError> {
                let task_id: i64 = row.try_get("taskid")?;
                Ok(CrashStatsRecord {
                    task_id: TaskId(task_id.max(0) as u64),
                    package: row.try_get("package")?,
                    version: row.try_get("version")?,
                    release: row.try_get("release")?,
                    arch: row.try_get("arch")?,
                    start_time: row.try_get("starttime")?,
                    duration: row.try_get("duration")?,
                    pre_running: row.try_get("prerunning")?,
                    post_running: row.try_get("postrunning")?,
                    chroot_size: row.try_get("chrootsize")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

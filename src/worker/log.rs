//! Local log of received notifications, read by the foreground app.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::Connection;

use super::WorkerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub title: String,
    pub body: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationLog: Send + Sync {
    /// Store an entry, assigning it the next id, and apply retention.
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, WorkerError>;

    /// All entries, newest first
    async fn list(&self) -> Result<Vec<LogEntry>, WorkerError>;

    /// Returns `false` if no entry has that id.
    async fn mark_read(&self, id: i64) -> Result<bool, WorkerError>;

    async fn mark_all_read(&self) -> Result<usize, WorkerError>;

    async fn unread_count(&self) -> Result<usize, WorkerError>;

    /// Drop entries older than the retention window and all but the
    /// newest entries beyond the size limit. Returns how many were
    /// removed.
    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, WorkerError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_age: TimeDelta,
    pub max_entries: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: TimeDelta::days(30),
            max_entries: 50,
        }
    }
}

/// `NotificationLog` stored in SQLite.
pub struct SqliteNotificationLog {
    db: Connection,
    retention: RetentionPolicy,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notification_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    url TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS notification_log_timestamp ON notification_log(timestamp);
"#;

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
    let millis: i64 = row.get(4)?;
    Ok(LogEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        url: row.get(3)?,
        timestamp: DateTime::from_timestamp_millis(millis).unwrap_or_default(),
        read: row.get(5)?,
    })
}

impl SqliteNotificationLog {
    pub async fn open(path: &str, retention: RetentionPolicy) -> Result<Self, WorkerError> {
        let db = Connection::open(path).await?;
        Self::initialize(db, retention).await
    }

    pub async fn open_in_memory(retention: RetentionPolicy) -> Result<Self, WorkerError> {
        let db = Connection::open_in_memory().await?;
        Self::initialize(db, retention).await
    }

    async fn initialize(db: Connection, retention: RetentionPolicy) -> Result<Self, WorkerError> {
        db.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { db, retention })
    }
}

#[async_trait]
impl NotificationLog for SqliteNotificationLog {
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, WorkerError> {
        let now = entry.timestamp;
        let stored = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "INSERT INTO notification_log (title, body, url, timestamp) VALUES (?, ?, ?, ?)",
                )?;
                stmt.execute(tokio_rusqlite::params![
                    entry.title,
                    entry.body,
                    entry.url,
                    entry.timestamp.timestamp_millis(),
                ])?;
                Ok(LogEntry {
                    id: conn.last_insert_rowid(),
                    title: entry.title,
                    body: entry.body,
                    timestamp: entry.timestamp,
                    read: false,
                    url: entry.url,
                })
            })
            .await?;

        self.prune(now).await?;
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<LogEntry>, WorkerError> {
        let entries = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, body, url, timestamp, read FROM notification_log ORDER BY timestamp DESC, id DESC",
                )?;
                let rows = stmt
                    .query_map([], row_to_entry)?
                    .filter_map(Result::ok)
                    .collect::<Vec<LogEntry>>();
                Ok(rows)
            })
            .await?;
        Ok(entries)
    }

    async fn mark_read(&self, id: i64) -> Result<bool, WorkerError> {
        let updated = self
            .db
            .call(move |conn| {
                let n = conn.execute("UPDATE notification_log SET read = 1 WHERE id = ?", [id])?;
                Ok(n)
            })
            .await?;
        Ok(updated > 0)
    }

    async fn mark_all_read(&self) -> Result<usize, WorkerError> {
        let updated = self
            .db
            .call(|conn| {
                let n = conn.execute("UPDATE notification_log SET read = 1 WHERE read = 0", [])?;
                Ok(n)
            })
            .await?;
        Ok(updated)
    }

    async fn unread_count(&self) -> Result<usize, WorkerError> {
        let count = self
            .db
            .call(|conn| {
                let n: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM notification_log WHERE read = 0",
                    [],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await?;
        Ok(count as usize)
    }

    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, WorkerError> {
        let cutoff = (now - self.retention.max_age).timestamp_millis();
        let max_entries = self.retention.max_entries as i64;
        let removed = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let expired =
                    tx.execute("DELETE FROM notification_log WHERE timestamp < ?", [cutoff])?;
                let overflow = tx.execute(
                    r#"
                    DELETE FROM notification_log WHERE id NOT IN (
                        SELECT id FROM notification_log
                        ORDER BY timestamp DESC, id DESC
                        LIMIT ?
                    )
                    "#,
                    [max_entries],
                )?;
                tx.commit()?;
                Ok(expired + overflow)
            })
            .await?;

        if removed > 0 {
            tracing::debug!("Pruned {} notification log entries", removed);
        }
        Ok(removed)
    }
}

// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, migrations, lifecycle.
//!
//! All reads and writes go through tokio-rusqlite's single background
//! thread. `Database` is the single writer; query modules take `&Database`
//! and call through [`Database::connection`]. Do not open additional
//! connections for writes.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use dialdesk_core::DialdeskError;
use rusqlite::Row;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::migrations::run_migrations;

/// Storage format for timestamps. Fixed width, so text order is time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply migrations, and
    /// configure the connection.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, DialdeskError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DialdeskError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations need a plain rusqlite connection; run them off the runtime.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), DialdeskError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| DialdeskError::Storage {
                    source: Box::new(e),
                })?;
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")
                    .map_err(|e| DialdeskError::Storage {
                        source: Box::new(e),
                    })?;
            }
            conn.execute_batch("PRAGMA foreign_keys = ON;")
                .map_err(|e| DialdeskError::Storage {
                    source: Box::new(e),
                })?;
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| DialdeskError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| DialdeskError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Convert a tokio-rusqlite error into `DialdeskError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DialdeskError {
    DialdeskError::Storage {
        source: Box::new(e),
    }
}

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_opt_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.as_ref().map(format_ts)
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Parse a strum-backed enum column.
pub(crate) fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        for expected in [
            "contact_groups",
            "contacts",
            "dialogs",
            "group_members",
            "prompt_templates",
            "scheduled_calls",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path, true).await.unwrap());
        Database::open(path, true).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fk.db");
        let db = Database::open(path.to_str().unwrap(), false).await.unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO dialogs (contact_id, date) VALUES (999, '2030-01-01T00:00:00.000000Z')",
                    [],
                )
            })
            .await;
        assert!(result.is_err(), "dangling contact_id should be rejected");
    }

    #[test]
    fn timestamps_sort_as_text() {
        let early = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(5);
        assert!(format_ts(&early) < format_ts(&late));
        assert_eq!(format_ts(&early), "2030-01-01T09:00:00.000000Z");
    }
}

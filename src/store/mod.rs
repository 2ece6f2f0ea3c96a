//! SQLite-backed record store.

pub mod adrs;
pub mod assessments;
pub mod institutions;
pub mod monitoring;
pub mod reviews;
pub mod tokens;
pub mod users;

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction};
use thiserror::Error;
use tracing::info;

use crate::domain::categories::UnknownLiteral;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("stored value rejected: {0}")]
    InvalidLiteral(#[from] UnknownLiteral),

    #[error("invalid stored timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("migration {version} failed: {reason}")]
    Migration { version: i64, reason: String },

    #[error("store connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Shared handle to the database. Every write runs in its own transaction.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database file and bring the schema up to date.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened record store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;",
        )?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run read-only queries.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside one transaction; any error rolls every statement back.
    pub fn write<T, E>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::from)?;
        let out = f(&tx)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(out)
    }
}

/// Apply every embedded migration newer than the recorded version.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current = current_version(conn)?;
    let migrations: [(i64, &str); 1] = [(1, include_str!("../../migrations/001_initial.sql"))];

    for (version, sql) in migrations {
        if version > current {
            info!(version, "running migration");
            conn.execute_batch(sql)
                .map_err(|err| StoreError::Migration {
                    version,
                    reason: err.to_string(),
                })?;
        }
    }
    Ok(())
}

/// Highest applied migration; 0 only when the version table does not exist yet.
fn current_version(conn: &Connection) -> Result<i64, StoreError> {
    let tracked: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !tracked {
        return Ok(0);
    }
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?)
}

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp(raw.to_string()))
}

pub(crate) fn parse_date(raw: Option<String>) -> Result<Option<NaiveDate>, StoreError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|_| StoreError::InvalidTimestamp(value.clone()))
    })
    .transpose()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn count_tables(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn migrations_create_every_table() {
        let store = Store::open_in_memory().unwrap();
        let tables = store
            .read(|conn| Ok::<_, StoreError>(count_tables(conn)))
            .unwrap();
        assert_eq!(tables, 8);
    }

    #[test]
    fn migrations_are_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.read(|conn| run_migrations(conn)).unwrap();
        let version = store.read(current_version).unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn untracked_database_starts_at_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn unreadable_version_table_aborts_migrations() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE schema_version (applied_at TEXT)")
            .unwrap();
        assert!(matches!(run_migrations(&conn), Err(StoreError::Sqlite(_))));
        let users: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'user'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(users, 0);
    }

    #[test]
    fn foreign_keys_enabled() {
        let store = Store::open_in_memory().unwrap();
        let fk: i64 = store
            .read(|conn| {
                let fk = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
                Ok::<_, StoreError>(fk)
            })
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn failed_write_rolls_back() {
        let (store, user) = test_support::store_with_user("rollback");
        let result: Result<(), StoreError> = store.write(|tx| {
            tx.execute("DELETE FROM user WHERE id = ?1", [&user.id])?;
            Err(StoreError::Constraint("abort".into()))
        });
        assert!(result.is_err());
        let still_there = store.read(|conn| users::get_user(conn, &user.id)).unwrap();
        assert_eq!(still_there.username, "rollback");
    }

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let raw = "2024-01-31T23:59:59.120Z";
        let parsed = parse_ts(raw).unwrap();
        assert_eq!(format_ts(&parsed), raw);
    }
}

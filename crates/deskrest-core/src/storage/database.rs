//! SQLite-based durable local state.
//!
//! Provides persistent storage for:
//! - Key-value store for the timer and screen-break snapshots
//! - Habit log (completed break records)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::{CoreError, StorageError};
use crate::habit::{HabitKind, HabitRecord, HabitSink, HabitStore};

use super::data_dir;

/// SQLite database for timer snapshots and habit records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/deskrest/deskrest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("deskrest.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS habit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_habit_log_recorded_at ON habit_log(recorded_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl HabitStore for Database {
    fn fetch(&self) -> Result<Vec<HabitRecord>, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, kind, recorded_at FROM habit_log ORDER BY recorded_at DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, DateTime<Utc>>(2)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (id, kind, at) = row?;
            records.push(HabitRecord {
                id,
                kind: HabitKind::parse(&kind),
                at,
            });
        }
        Ok(records)
    }

    fn create(&self, kind: HabitKind, at: DateTime<Utc>) -> Result<HabitRecord, CoreError> {
        self.conn.execute(
            "INSERT INTO habit_log (kind, recorded_at) VALUES (?1, ?2)",
            params![kind.as_str(), at.to_rfc3339()],
        )?;
        Ok(HabitRecord {
            id: self.conn.last_insert_rowid(),
            kind,
            at,
        })
    }

    fn delete(&self, id: i64) -> Result<(), CoreError> {
        self.conn
            .execute("DELETE FROM habit_log WHERE id = ?1", params![id])?;
        Ok(())
    }
}

impl HabitSink for Database {
    fn record(&self, kind: HabitKind, at: DateTime<Utc>) -> Result<(), CoreError> {
        self.create(kind, at).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "replaced").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "replaced");
    }

    #[test]
    fn habit_log_roundtrip() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let rec = db.create(HabitKind::RestBreak, now).unwrap();
        db.create(HabitKind::ScreenBreak, now).unwrap();

        let all = db.fetch().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|r| r.kind == HabitKind::RestBreak));

        db.delete(rec.id).unwrap();
        assert_eq!(db.fetch().unwrap().len(), 1);
    }
}

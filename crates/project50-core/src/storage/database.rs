//! SQLite-backed challenge storage.
//!
//! A single key-value table holds the serialized challenge and the
//! last-update marker. There is no schema beyond that; the record is an
//! opaque JSON blob.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use super::{
    data_dir, decode_record, decode_timestamp, encode_record, ChallengeStore, CHALLENGE_KEY,
    LAST_UPDATE_KEY,
};
use crate::challenge::ChallengeRecord;
use crate::error::{Result, StorageError};

/// SQLite database for challenge state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/project50.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("project50.db"))
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are fine.
    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl ChallengeStore for Database {
    fn load(&self) -> Result<Option<ChallengeRecord>> {
        Ok(self
            .kv_get(CHALLENGE_KEY)?
            .and_then(|blob| decode_record(&blob)))
    }

    fn save(&self, record: &ChallengeRecord) -> Result<()> {
        let blob = encode_record(record)?;
        self.kv_set(CHALLENGE_KEY, &blob)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM kv WHERE key IN (?1, ?2)",
            params![CHALLENGE_KEY, LAST_UPDATE_KEY],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .kv_get(LAST_UPDATE_KEY)?
            .and_then(|raw| decode_timestamp(&raw)))
    }

    fn mark_updated(&self, at: DateTime<Utc>) -> Result<()> {
        self.kv_set(LAST_UPDATE_KEY, &at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        Ok(())
    }
}

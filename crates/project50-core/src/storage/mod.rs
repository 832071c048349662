//! Persistence gateway for the challenge record.
//!
//! The engine only sees [`ChallengeStore`]: two logical keys, the record
//! blob and a "last update" marker. [`Database`] keeps them in SQLite,
//! [`MemoryStore`] keeps them in process.

mod config;
pub mod database;
pub mod memory;

pub use config::{ChallengeConfig, Config, LoggingConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::challenge::ChallengeRecord;
use crate::error::{Result, StorageError};

/// Key of the serialized challenge record.
pub const CHALLENGE_KEY: &str = "current_challenge";
/// Key of the RFC 3339 timestamp of the last day check that wrote state.
pub const LAST_UPDATE_KEY: &str = "last_update_time";

/// Load/save capability the engine is constructed with.
pub trait ChallengeStore: Send {
    /// The stored record, or `None` when absent or undecodable.
    fn load(&self) -> Result<Option<ChallengeRecord>>;

    fn save(&self, record: &ChallengeRecord) -> Result<()>;

    /// Remove the record and the last-update marker.
    fn clear(&self) -> Result<()>;

    fn last_update(&self) -> Result<Option<DateTime<Utc>>>;

    fn mark_updated(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Decode a stored record blob. A blob that no longer parses is treated
/// as "no challenge" so a bad write can never wedge the app.
pub(crate) fn decode_record(blob: &str) -> Option<ChallengeRecord> {
    match serde_json::from_str::<ChallengeRecord>(blob) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "discarding undecodable challenge record");
            None
        }
    }
}

pub(crate) fn encode_record(record: &ChallengeRecord) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

pub(crate) fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(error = %e, raw, "ignoring malformed last-update marker");
            None
        }
    }
}

/// Returns the data directory, creating it if needed.
///
/// `PROJECT50_HOME` overrides the location entirely. Otherwise this is
/// `~/.config/project50[-dev]/`, with `PROJECT50_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("PROJECT50_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PROJECT50_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("project50-dev")
            } else {
                base_dir.join("project50")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

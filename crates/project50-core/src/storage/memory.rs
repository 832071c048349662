//! In-process challenge storage.
//!
//! Keeps the same two blobs the SQLite store keeps, so encode/decode paths
//! are shared. Clones share state, which lets a test keep a handle on the
//! store it gave to the engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};

use super::{
    decode_record, decode_timestamp, encode_record, ChallengeStore, CHALLENGE_KEY,
    LAST_UPDATE_KEY,
};
use crate::challenge::ChallengeRecord;
use crate::error::{Result, StorageError};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    fail_writes: bool,
    saves: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the record key with an arbitrary blob.
    pub fn with_raw_record(blob: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().values.insert(CHALLENGE_KEY.to_string(), blob.into());
        store
    }

    /// Make every subsequent write fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful record saves so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, key: &str, value: String) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::WriteRejected(key.to_string()).into());
        }
        inner.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl ChallengeStore for MemoryStore {
    fn load(&self) -> Result<Option<ChallengeRecord>> {
        Ok(self.raw(CHALLENGE_KEY).and_then(|blob| decode_record(&blob)))
    }

    fn save(&self, record: &ChallengeRecord) -> Result<()> {
        self.write(CHALLENGE_KEY, encode_record(record)?)?;
        self.lock().saves += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::WriteRejected(CHALLENGE_KEY.to_string()).into());
        }
        inner.values.remove(CHALLENGE_KEY);
        inner.values.remove(LAST_UPDATE_KEY);
        Ok(())
    }

    fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.raw(LAST_UPDATE_KEY).and_then(|raw| decode_timestamp(&raw)))
    }

    fn mark_updated(&self, at: DateTime<Utc>) -> Result<()> {
        self.write(LAST_UPDATE_KEY, at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.mark_updated(Utc::now()).unwrap();
        assert!(other.last_update().unwrap().is_some());
    }

    #[test]
    fn failing_writes_leave_previous_value() {
        let store = MemoryStore::with_raw_record("garbage");
        store.set_fail_writes(true);
        assert!(store.mark_updated(Utc::now()).is_err());
        assert!(store.clear().is_err());
        assert_eq!(store.raw(CHALLENGE_KEY).as_deref(), Some("garbage"));
        assert!(store.load().unwrap().is_none());
    }
}

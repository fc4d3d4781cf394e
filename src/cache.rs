//! Ephemeral key/value state with max-age reads.
//!
//! Each key is a small JSON file stamped with the time it was stored. A read
//! passes the maximum age it accepts; older entries read as absent.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::storage::{BackendLocal, StorageManager};

pub const REBUILD_IN_PROGRESS: &str = "rebuild_in_progress";
pub const FRESH_INDEX: &str = "fresh_index";

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    value: T,
    stored_at_ms: i64,
}

pub struct Cache {
    store: BackendLocal,
}

impl Cache {
    pub fn new(cache_dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            store: BackendLocal::new(cache_dir)?,
        })
    }

    fn ident(key: &str) -> String {
        format!("{key}.cache.json")
    }

    pub fn put<T: Serialize>(&self, key: &str, value: T) -> anyhow::Result<()> {
        let entry = CacheEntry {
            value,
            stored_at_ms: Utc::now().timestamp_millis(),
        };
        self.store
            .write(&Self::ident(key), &serde_json::to_vec(&entry)?)?;
        Ok(())
    }

    /// Returns `None` for missing, expired or unreadable entries.
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        let ident = Self::ident(key);
        if !self.store.exists(&ident) {
            return None;
        }

        let bytes = self.store.read(&ident).ok()?;
        let entry: CacheEntry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("dropping unreadable cache entry {key}: {err}");
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.stored_at_ms;
        if age_ms < 0 || age_ms as u128 > max_age.as_millis() {
            return None;
        }

        Some(entry.value)
    }

    pub fn clear(&self, key: &str) -> std::io::Result<()> {
        self.store.delete(&Self::ident(key))
    }

    /// Reads a boolean flag; absent or expired reads as `false`.
    pub fn flag(&self, key: &str, max_age: Duration) -> bool {
        self.get::<bool>(key, max_age).unwrap_or(false)
    }
}

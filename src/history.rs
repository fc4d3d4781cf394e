//! Visit frequency lookups against browser history snapshots.
//!
//! The browser keeps its History database open and locked while running, so
//! a rebuild never queries the live file: each profile's store is copied to
//! a private temp file and opened read-only. Snapshots live only for the
//! duration of one rebuild and their temp copies are removed on close.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tempfile::NamedTempFile;

/// Visits shorter than a measurable view are bounces or redirects.
const QUALIFYING_VISITS_SQL: &str = "
    SELECT count(*)
    FROM visits
    JOIN urls ON urls.id = visits.url
    WHERE urls.url = ?1
    AND visits.visit_duration > 0";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Answers how often a URL was genuinely visited.
pub trait FrequencySource {
    fn qualifying_visit_count(&self, url: &str) -> Result<u64, HistoryError>;
}

/// A read-only private copy of one profile's history store.
pub struct HistorySnapshot {
    conn: Connection,
    file: NamedTempFile,
}

impl HistorySnapshot {
    /// Copies `history_path` into `snapshot_dir` and opens the copy.
    pub fn open(profile: &str, history_path: &Path, snapshot_dir: &Path) -> Result<Self, HistoryError> {
        std::fs::create_dir_all(snapshot_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(&format!("History-{}-", sanitize(profile)))
            .suffix(".db")
            .tempfile_in(snapshot_dir)?;

        let mut source = File::open(history_path)?;
        std::io::copy(&mut source, file.as_file_mut())?;
        file.as_file().sync_all()?;

        let conn = Connection::open_with_flags(
            file.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self { conn, file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Closes the connection and deletes the temp copy.
    pub fn close(self) -> Result<(), HistoryError> {
        let Self { conn, file } = self;
        if let Err((_conn, err)) = conn.close() {
            log::warn!("failed to close history snapshot cleanly: {err}");
        }
        file.close()?;
        Ok(())
    }
}

impl FrequencySource for HistorySnapshot {
    fn qualifying_visit_count(&self, url: &str) -> Result<u64, HistoryError> {
        let mut stmt = self.conn.prepare_cached(QUALIFYING_VISITS_SQL)?;
        let count: i64 = stmt.query_row([url], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

/// Scores every url as unvisited.
#[cfg(test)]
pub struct NoHistory;

#[cfg(test)]
impl FrequencySource for NoHistory {
    fn qualifying_visit_count(&self, _url: &str) -> Result<u64, HistoryError> {
        Ok(0)
    }
}

/// Snapshots opened for a single rebuild, keyed by profile.
pub struct HistorySnapshots {
    dir: PathBuf,
    snapshots: HashMap<String, HistorySnapshot>,
}

impl HistorySnapshots {
    /// Temp copies are created inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            snapshots: HashMap::new(),
        }
    }

    /// Opens a snapshot for `profile`, logging and returning `None` when the
    /// store is missing or cannot be copied.
    pub fn open(&mut self, profile: &str, history_path: &Path) -> Option<&HistorySnapshot> {
        if !history_path.is_file() {
            log::warn!(
                "history for profile {profile} not found at {}",
                history_path.display()
            );
            return None;
        }

        // a profile opened twice keeps only its newest copy
        self.close(profile);

        log::debug!("creating temporary copy of history for profile {profile}");
        match HistorySnapshot::open(profile, history_path, &self.dir) {
            Ok(snapshot) => {
                log::debug!("history copy at {}", snapshot.path().display());
                self.snapshots.insert(profile.to_string(), snapshot);
                self.snapshots.get(profile)
            }
            Err(err) => {
                log::error!(
                    "error copying/opening history {} for profile {profile}: {err}",
                    history_path.display()
                );
                None
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, profile: &str) -> Option<&HistorySnapshot> {
        self.snapshots.get(profile)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn close(&mut self, profile: &str) {
        if let Some(snapshot) = self.snapshots.remove(profile) {
            log::debug!("deleting temporary copy of history for profile {profile}");
            if let Err(err) = snapshot.close() {
                log::warn!("failed to delete history snapshot for profile {profile}: {err}");
            }
        }
    }

    pub fn close_all(&mut self) {
        let profiles: Vec<String> = self.snapshots.keys().cloned().collect();
        for profile in profiles {
            self.close(&profile);
        }
    }
}

impl Drop for HistorySnapshots {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn sanitize(profile: &str) -> String {
    profile
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

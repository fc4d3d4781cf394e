//! Settings that survive across runs.
//!
//! Only the published index slot lives here. The file is replaced atomically,
//! so the foreground query process can read it while a rebuild publishes.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::index::IndexSlot;
use crate::storage::{BackendLocal, StorageManager};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub current_index_slot: IndexSlot,
}

pub struct SettingsStore {
    store: BackendLocal,
}

impl SettingsStore {
    pub fn new(base_path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            store: BackendLocal::new(base_path)?,
        })
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load(&self) -> Settings {
        if !self.store.exists(SETTINGS_FILE) {
            return Settings::default();
        }

        match self
            .store
            .read(SETTINGS_FILE)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| serde_json::from_slice(&bytes).context("settings are malformed"))
        {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("failed to read {SETTINGS_FILE}, using defaults: {err:#}");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let data = serde_json::to_vec_pretty(settings)?;
        self.store
            .write(SETTINGS_FILE, &data)
            .with_context(|| format!("failed to write {SETTINGS_FILE}"))?;
        Ok(())
    }
}

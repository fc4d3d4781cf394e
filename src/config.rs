use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use homedir::my_home;
use serde::{Deserialize, Serialize};

use crate::storage::{BackendLocal, StorageManager};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_PROFILE: &str = "Default";
const DEFAULT_ICON: &str = "icon.png";
/// Age after which a committed index is considered stale
const DEFAULT_FRESH_INDEX_MAX_AGE_SECS: u64 = 300;
/// A rebuild flag older than this is treated as left over by a crashed rebuild
const DEFAULT_REBUILD_FLAG_MAX_AGE_SECS: u64 = 600;
const DEFAULT_WRITER_HEAP_BYTES: usize = 50_000_000;

#[cfg(target_os = "macos")]
const CHROME_DIR: &str = "Library/Application Support/Google/Chrome";
#[cfg(target_os = "windows")]
const CHROME_DIR: &str = "AppData/Local/Google/Chrome/User Data";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CHROME_DIR: &str = ".config/google-chrome";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Browser user-data directory holding one sub-directory per profile
    #[serde(default = "default_browser_dir")]
    pub browser_dir: PathBuf,

    #[serde(default = "default_profiles")]
    pub profiles: Vec<String>,

    /// Icon used for profiles without a profile picture
    #[serde(default = "default_icon")]
    pub default_icon: String,

    #[serde(default = "fresh_index_max_age_secs")]
    pub fresh_index_max_age_secs: u64,

    #[serde(default = "rebuild_flag_max_age_secs")]
    pub rebuild_flag_max_age_secs: u64,

    #[serde(default = "writer_heap_bytes")]
    pub writer_heap_bytes: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_dir: default_browser_dir(),
            profiles: default_profiles(),
            default_icon: default_icon(),
            fresh_index_max_age_secs: fresh_index_max_age_secs(),
            rebuild_flag_max_age_secs: rebuild_flag_max_age_secs(),
            writer_heap_bytes: writer_heap_bytes(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_browser_dir() -> PathBuf {
    match my_home() {
        Ok(Some(home)) => home.join(CHROME_DIR),
        _ => PathBuf::from(CHROME_DIR),
    }
}

fn default_profiles() -> Vec<String> {
    vec![DEFAULT_PROFILE.to_string()]
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn fresh_index_max_age_secs() -> u64 {
    DEFAULT_FRESH_INDEX_MAX_AGE_SECS
}

fn rebuild_flag_max_age_secs() -> u64 {
    DEFAULT_REBUILD_FLAG_MAX_AGE_SECS
}

fn writer_heap_bytes() -> usize {
    DEFAULT_WRITER_HEAP_BYTES
}

/// Resolves the application base directory.
///
/// `BMK_BASE_PATH` wins, otherwise `~/.local/share/bmk`.
pub fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("BMK_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/bmk"))
}

impl Config {
    fn validate(&mut self) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        self.profiles
            .retain(|profile| !profile.trim().is_empty() && seen.insert(profile.clone()));

        if self.fresh_index_max_age_secs == 0 {
            bail!("fresh_index_max_age_secs must be greater than 0");
        }

        if self.rebuild_flag_max_age_secs == 0 {
            bail!("rebuild_flag_max_age_secs must be greater than 0");
        }

        // tantivy refuses a writer below 15MB per thread
        if self.writer_heap_bytes < 15_000_000 {
            self.writer_heap_bytes = 15_000_000;
        }

        Ok(())
    }

    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let store = BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str =
            String::from_utf8(store.read(CONFIG_FILE)?).context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding the index slots and cached state
    pub fn cache_dir(&self) -> PathBuf {
        self.base_path.join("cache")
    }

    /// Where rebuilds keep their temporary History copies
    pub fn snapshot_dir(&self) -> PathBuf {
        self.cache_dir().join("history")
    }

    pub fn profile_dir(&self, profile: &str) -> PathBuf {
        self.browser_dir.join(profile)
    }

    pub fn add_profile(&mut self, profile: &str) -> bool {
        if self.profiles.iter().any(|p| p == profile) {
            return false;
        }
        self.profiles.push(profile.to_string());
        true
    }

    pub fn remove_profile(&mut self, profile: &str) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|p| p != profile);
        before != self.profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load_with(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(config.profiles, vec!["Default".to_string()]);
        assert_eq!(config.fresh_index_max_age_secs, 300);
        assert_eq!(config.cache_dir(), dir.path().join("cache"));
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "profiles:\n  - Profile 1\nbrowser_dir: /tmp/chrome\n",
        )
        .unwrap();

        let config = Config::load_with(dir.path()).unwrap();

        assert_eq!(config.profiles, vec!["Profile 1".to_string()]);
        assert_eq!(config.profile_dir("Profile 1"), PathBuf::from("/tmp/chrome/Profile 1"));
        assert_eq!(config.default_icon, "icon.png");

        // upgraded config was saved back with the defaults
        let saved = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(saved.contains("fresh_index_max_age_secs"));
    }

    #[test]
    fn test_rejects_zero_max_age() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "fresh_index_max_age_secs: 0\n").unwrap();

        assert!(Config::load_with(dir.path()).is_err());
    }

    #[test]
    fn test_profile_add_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_with(dir.path()).unwrap();

        assert!(config.add_profile("Profile 2"));
        assert!(!config.add_profile("Profile 2"));
        config.save().unwrap();

        let reloaded = Config::load_with(dir.path()).unwrap();
        assert_eq!(reloaded.profiles, vec!["Default".to_string(), "Profile 2".to_string()]);

        let mut reloaded = reloaded;
        assert!(reloaded.remove_profile("Default"));
        assert!(!reloaded.remove_profile("Default"));
        assert_eq!(reloaded.profiles, vec!["Profile 2".to_string()]);
    }
}

//! Decides when the index gets rebuilt.
//!
//! Rebuilds run out of the request path in a separate process. A missing
//! index triggers one before querying; a stale index is served first and
//! refreshed afterwards.

use std::process::{Command, Stdio};
use std::time::Duration;

use crate::cache::{self, Cache};
use crate::config::Config;

pub const UPDATE_INDEX_COMMAND: &str = "update-index";

/// Starts a rebuild without waiting for it.
pub trait RebuildLauncher {
    fn launch(&self) -> std::io::Result<()>;
}

/// Re-executes the current binary as `bmk update-index`, detached.
pub struct ProcessLauncher;

impl RebuildLauncher for ProcessLauncher {
    fn launch(&self) -> std::io::Result<()> {
        let exe = std::env::current_exe()?;
        let child = Command::new(exe)
            .arg(UPDATE_INDEX_COMMAND)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        log::debug!("started background rebuild, pid {}", child.id());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Launched,
    AlreadyRunning,
    Fresh,
    Failed,
}

pub struct RefreshScheduler<'a> {
    config: &'a Config,
    cache: &'a Cache,
    launcher: &'a dyn RebuildLauncher,
}

impl<'a> RefreshScheduler<'a> {
    pub fn new(config: &'a Config, cache: &'a Cache, launcher: &'a dyn RebuildLauncher) -> Self {
        Self {
            config,
            cache,
            launcher,
        }
    }

    pub fn rebuild_in_progress(&self) -> bool {
        self.cache.flag(
            cache::REBUILD_IN_PROGRESS,
            Duration::from_secs(self.config.rebuild_flag_max_age_secs),
        )
    }

    pub fn is_fresh(&self) -> bool {
        self.cache.flag(
            cache::FRESH_INDEX,
            Duration::from_secs(self.config.fresh_index_max_age_secs),
        )
    }

    /// Called when no slot is published: start the first rebuild.
    pub fn ensure_index(&self) -> Trigger {
        self.trigger()
    }

    /// Called after a query was served from an existing slot.
    pub fn refresh_if_stale(&self) -> Trigger {
        if self.is_fresh() {
            return Trigger::Fresh;
        }
        log::info!("index outdated, reindexing");
        self.trigger()
    }

    fn trigger(&self) -> Trigger {
        if self.rebuild_in_progress() {
            return Trigger::AlreadyRunning;
        }

        if let Err(err) = self.cache.put(cache::REBUILD_IN_PROGRESS, true) {
            log::warn!("failed to mark rebuild in progress: {err:#}");
        }

        match self.launcher.launch() {
            Ok(()) => Trigger::Launched,
            Err(err) => {
                log::error!("failed to start background rebuild: {err}");
                let _ = self.cache.clear(cache::REBUILD_IN_PROGRESS);
                Trigger::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingLauncher {
        launches: Cell<usize>,
        fail: bool,
    }

    impl CountingLauncher {
        fn new(fail: bool) -> Self {
            Self {
                launches: Cell::new(0),
                fail,
            }
        }
    }

    impl RebuildLauncher for CountingLauncher {
        fn launch(&self) -> std::io::Result<()> {
            self.launches.set(self.launches.get() + 1);
            if self.fail {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no binary"))
            } else {
                Ok(())
            }
        }
    }

    fn setup() -> (tempfile::TempDir, Config, Cache) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with(dir.path()).unwrap();
        let cache = Cache::new(&config.cache_dir()).unwrap();
        (dir, config, cache)
    }

    #[test]
    fn test_missing_index_launches_once() {
        let (_dir, config, cache) = setup();
        let launcher = CountingLauncher::new(false);
        let scheduler = RefreshScheduler::new(&config, &cache, &launcher);

        assert_eq!(scheduler.ensure_index(), Trigger::Launched);
        // second trigger while the first is running is a no-op
        assert_eq!(scheduler.ensure_index(), Trigger::AlreadyRunning);
        assert_eq!(launcher.launches.get(), 1);
    }

    #[test]
    fn test_fresh_index_is_not_rebuilt() {
        let (_dir, config, cache) = setup();
        cache.put(cache::FRESH_INDEX, true).unwrap();
        let launcher = CountingLauncher::new(false);
        let scheduler = RefreshScheduler::new(&config, &cache, &launcher);

        assert_eq!(scheduler.refresh_if_stale(), Trigger::Fresh);
        assert_eq!(launcher.launches.get(), 0);
    }

    #[test]
    fn test_stale_index_is_rebuilt() {
        let (_dir, config, cache) = setup();
        let launcher = CountingLauncher::new(false);
        let scheduler = RefreshScheduler::new(&config, &cache, &launcher);

        assert_eq!(scheduler.refresh_if_stale(), Trigger::Launched);
        assert!(scheduler.rebuild_in_progress());
    }

    #[test]
    fn test_stale_index_with_rebuild_running() {
        let (_dir, config, cache) = setup();
        cache.put(cache::REBUILD_IN_PROGRESS, true).unwrap();
        let launcher = CountingLauncher::new(false);
        let scheduler = RefreshScheduler::new(&config, &cache, &launcher);

        assert_eq!(scheduler.refresh_if_stale(), Trigger::AlreadyRunning);
        assert_eq!(launcher.launches.get(), 0);
    }

    #[test]
    fn test_failed_launch_clears_flag() {
        let (_dir, config, cache) = setup();
        let launcher = CountingLauncher::new(true);
        let scheduler = RefreshScheduler::new(&config, &cache, &launcher);

        assert_eq!(scheduler.ensure_index(), Trigger::Failed);
        assert!(!scheduler.rebuild_in_progress());
    }
}

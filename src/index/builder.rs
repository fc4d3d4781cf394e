//! Double-buffered index rebuilds.
//!
//! # Error Handling Strategy
//!
//! - **Per url**: a failed visit lookup is logged by the walker and scored 0.
//! - **Per profile**: a missing bookmark or history file, or an unparsable
//!   bookmark file, is logged and the profile contributes no documents.
//! - **Per rebuild**: failing to create, fill or commit the writer aborts the
//!   rebuild and is returned to the caller. The published slot is untouched
//!   and keeps serving queries.
//!
//! History snapshots are closed on every exit path.

use tantivy::IndexWriter;

use crate::bookmarks::ProfileSource;
use crate::cache::{self, Cache};
use crate::config::Config;
use crate::history::HistorySnapshots;
use crate::settings::{Settings, SettingsStore};
use crate::walker::{DocumentSink, Walker};

use super::schema::{BookmarkDocument, BookmarkFields};
use super::{BookmarkIndex, IndexError, IndexSlot};

struct WriterSink<'w> {
    writer: &'w IndexWriter,
    fields: BookmarkFields,
}

impl DocumentSink for WriterSink<'_> {
    fn add(&mut self, doc: BookmarkDocument) -> Result<(), IndexError> {
        self.writer.add_document(self.fields.to_document(&doc))?;
        Ok(())
    }
}

pub struct IndexBuilder<'a> {
    config: &'a Config,
    settings: &'a SettingsStore,
    cache: &'a Cache,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(config: &'a Config, settings: &'a SettingsStore, cache: &'a Cache) -> Self {
        Self {
            config,
            settings,
            cache,
        }
    }

    pub fn current_slot(&self) -> IndexSlot {
        self.settings.load().current_index_slot
    }

    /// Opens the published slot, or `None` when it was never built.
    pub fn current_index(&self) -> Result<Option<BookmarkIndex>, IndexError> {
        let slot = self.current_slot();
        let dir = slot.dir_in(&self.config.cache_dir());
        if !BookmarkIndex::exists(&dir) {
            return Ok(None);
        }
        BookmarkIndex::open(&dir, slot).map(Some)
    }

    /// Builds the inactive slot from `profiles`, commits it and publishes it.
    pub fn rebuild(&self, profiles: &[ProfileSource]) -> Result<BookmarkIndex, IndexError> {
        let span = tracing::info_span!("rebuild", profiles = profiles.len());
        let _enter = span.enter();

        if let Err(err) = self.cache.put(cache::REBUILD_IN_PROGRESS, true) {
            log::warn!("failed to mark rebuild in progress: {err:#}");
        }

        let mut snapshots = HistorySnapshots::in_dir(self.config.snapshot_dir());
        let result = self.build_and_publish(profiles, &mut snapshots);

        if let Err(err) = self.cache.clear(cache::REBUILD_IN_PROGRESS) {
            log::warn!("failed to clear rebuild flag: {err}");
        }
        match &result {
            Ok(index) => {
                if let Err(err) = self.cache.put(cache::FRESH_INDEX, true) {
                    log::warn!("failed to mark index fresh: {err:#}");
                }
                log::info!("published search index slot {}", index.slot());
            }
            Err(err) => {
                log::error!("rebuild failed, keeping slot {}: {err}", self.current_slot());
            }
        }

        snapshots.close_all();
        result
    }

    fn build_and_publish(
        &self,
        profiles: &[ProfileSource],
        snapshots: &mut HistorySnapshots,
    ) -> Result<BookmarkIndex, IndexError> {
        let target = self.current_slot().other();
        let dir = target.dir_in(&self.config.cache_dir());

        log::info!("building the search index slot {target} in {}", dir.display());
        let index = BookmarkIndex::create(&dir, target)?;
        let mut writer = index.writer(self.config.writer_heap_bytes)?;

        let mut documents = 0;
        {
            let mut sink = WriterSink {
                writer: &writer,
                fields: *index.fields(),
            };
            for profile in profiles {
                documents += self.index_profile(profile, snapshots, &mut sink)?;
            }
        }

        writer.commit()?;
        writer.wait_merging_threads()?;
        log::info!("completed the search index slot {target}: {documents} documents");

        self.settings
            .save(&Settings {
                current_index_slot: target,
            })
            .map_err(|err| IndexError::Publish {
                slot: target,
                message: format!("{err:#}"),
            })?;

        Ok(index)
    }

    fn index_profile(
        &self,
        profile: &ProfileSource,
        snapshots: &mut HistorySnapshots,
        sink: &mut dyn DocumentSink,
    ) -> Result<usize, IndexError> {
        let name = profile.profile.as_str();

        if !profile.bookmarks_path.is_file() {
            log::warn!(
                "bookmarks for profile {name} not found at {}",
                profile.bookmarks_path.display()
            );
            return Ok(0);
        }

        let Some(snapshot) = snapshots.open(name, &profile.history_path) else {
            log::warn!("skipping profile {name}: no history available");
            return Ok(0);
        };

        let roots = match profile.read_roots() {
            Ok(roots) => roots,
            Err(err) => {
                log::warn!("skipping profile {name}: {err:#}");
                return Ok(0);
            }
        };

        log::debug!("indexing {} bookmark roots of profile {name}", roots.len());
        let walker = Walker::new(name, &profile.icon, snapshot);
        let documents = roots
            .iter()
            .try_fold(0, |documents, root| Ok::<_, IndexError>(documents + walker.walk(root, "", sink)?));
        snapshots.close(name);

        documents
    }
}

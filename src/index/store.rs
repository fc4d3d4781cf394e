use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};

use super::schema::{build_schema, register_analyzers, BookmarkFields};
use super::{IndexError, IndexSlot};

/// tantivy writes this file on creation and on every commit
const META_FILE: &str = "meta.json";

/// An index slot opened on disk.
pub struct BookmarkIndex {
    index: Index,
    slot: IndexSlot,
    dir: PathBuf,
    fields: BookmarkFields,
}

impl BookmarkIndex {
    pub fn exists(dir: &Path) -> bool {
        dir.join(META_FILE).is_file()
    }

    /// Creates an empty index in `dir`, discarding whatever the slot held.
    pub fn create(dir: &Path, slot: IndexSlot) -> Result<Self, IndexError> {
        if dir.exists() {
            log::debug!("discarding previous content of slot {slot}");
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;

        let index = Index::create_in_dir(dir, build_schema())?;
        Self::from_index(index, slot, dir)
    }

    pub fn open(dir: &Path, slot: IndexSlot) -> Result<Self, IndexError> {
        log::debug!("opening search index slot {slot} in {}", dir.display());
        let index = Index::open_in_dir(dir)?;
        Self::from_index(index, slot, dir)
    }

    fn from_index(index: Index, slot: IndexSlot, dir: &Path) -> Result<Self, IndexError> {
        register_analyzers(&index);
        let fields = BookmarkFields::from_schema(&index.schema())?;
        Ok(Self {
            index,
            slot,
            dir: dir.to_path_buf(),
            fields,
        })
    }

    pub fn slot(&self) -> IndexSlot {
        self.slot
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fields(&self) -> &BookmarkFields {
        &self.fields
    }

    /// Single-threaded writer, so documents keep their insertion order.
    pub fn writer(&self, heap_bytes: usize) -> Result<IndexWriter, IndexError> {
        Ok(self.index.writer_with_num_threads(1, heap_bytes)?)
    }

    /// A reader pinned to the last commit; it never observes later writes.
    pub fn reader(&self) -> Result<IndexReader, IndexError> {
        Ok(self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?)
    }

    pub fn doc_count(&self) -> Result<u64, IndexError> {
        Ok(self.reader()?.searcher().num_docs())
    }
}

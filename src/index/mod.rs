//! Full-text index over bookmark folders.
//!
//! # Architecture
//!
//! - `schema`: field descriptor table, analyzers and the document type
//! - `tokenizer`: edge n-gram tokenizer backing the prefix and fuzzy fields
//! - `slot`: the two physical index instances and their naming
//! - `store`: opening/creating one slot on disk
//! - `builder`: rebuilds the inactive slot and publishes it
//! - `query`: prefix + fuzzy n-gram search over the published slot

mod builder;
mod query;
mod schema;
mod slot;
mod store;
mod tokenizer;

pub use builder::IndexBuilder;
#[cfg(test)]
pub use query::RESULT_LIMIT;
pub use query::{QueryEngine, QueryOutcome, SearchHit};
pub use schema::BookmarkDocument;
pub use slot::IndexSlot;
pub use store::BookmarkIndex;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to publish slot {slot}: {message}")]
    Publish { slot: IndexSlot, message: String },
}

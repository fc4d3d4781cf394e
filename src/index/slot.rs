use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const INDEX_PREFIX: &str = "bookmarks-";

/// One of the two physical index instances.
///
/// A rebuild always writes the slot that is not currently published, so
/// readers of the published slot never see a partially written index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexSlot {
    #[default]
    A,
    B,
}

impl IndexSlot {
    pub fn other(self) -> IndexSlot {
        match self {
            IndexSlot::A => IndexSlot::B,
            IndexSlot::B => IndexSlot::A,
        }
    }

    pub fn dir_name(self) -> String {
        format!("{INDEX_PREFIX}{self}")
    }

    pub fn dir_in(self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.dir_name())
    }
}

impl Display for IndexSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexSlot::A => write!(f, "a"),
            IndexSlot::B => write!(f, "b"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_flips() {
        assert_eq!(IndexSlot::A.other(), IndexSlot::B);
        assert_eq!(IndexSlot::B.other(), IndexSlot::A);
        assert_eq!(IndexSlot::A.other().other(), IndexSlot::A);
    }

    #[test]
    fn test_default_is_a() {
        assert_eq!(IndexSlot::default(), IndexSlot::A);
    }

    #[test]
    fn test_dir_names() {
        let cache = Path::new("/tmp/cache");
        assert_eq!(IndexSlot::A.dir_in(cache), PathBuf::from("/tmp/cache/bookmarks-a"));
        assert_eq!(IndexSlot::B.dir_name(), "bookmarks-b");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&IndexSlot::B).unwrap(), "\"b\"");
        let slot: IndexSlot = serde_json::from_str("\"a\"").unwrap();
        assert_eq!(slot, IndexSlot::A);
    }
}

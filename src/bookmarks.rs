use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::config::Config;

const BOOKMARKS_FILE: &str = "Bookmarks";
const HISTORY_FILE: &str = "History";
const PROFILE_PICTURE: &str = "Google Profile Picture.png";

/// A node of the browser bookmark tree.
///
/// A node with `children` is a folder, otherwise it is a leaf with a url.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarkNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn folder(name: &str, children: Vec<BookmarkNode>) -> Self {
        Self {
            name: name.to_string(),
            url: None,
            children: Some(children),
        }
    }

    pub fn leaf(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: Some(url.to_string()),
            children: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.children.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct BookmarkFile {
    roots: serde_json::Map<String, serde_json::Value>,
}

/// Parses a bookmark file and returns its top-level containers.
///
/// Entries under `roots` that are not folders (older files carry sync
/// metadata there) are skipped.
pub fn parse_bookmark_roots(data: &[u8]) -> anyhow::Result<Vec<BookmarkNode>> {
    let file: BookmarkFile =
        serde_json::from_slice(data).context("bookmark file is not valid json")?;

    let roots = file
        .roots
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<BookmarkNode>(value) {
            Ok(node) if node.is_folder() => Some(node),
            Ok(_) => None,
            Err(err) => {
                log::debug!("skipping bookmark root {key}: {err}");
                None
            }
        })
        .collect();

    Ok(roots)
}

/// Files belonging to one browser profile.
#[derive(Debug, Clone)]
pub struct ProfileSource {
    pub profile: String,
    pub bookmarks_path: PathBuf,
    pub history_path: PathBuf,
    pub icon: String,
}

impl ProfileSource {
    pub fn new(config: &Config, profile: &str) -> Self {
        let profile_dir = config.profile_dir(profile);
        Self::in_dir(&profile_dir, profile, &config.default_icon)
    }

    pub fn in_dir(profile_dir: &Path, profile: &str, default_icon: &str) -> Self {
        let picture = profile_dir.join(PROFILE_PICTURE);
        let icon = if picture.is_file() {
            picture.to_string_lossy().to_string()
        } else {
            default_icon.to_string()
        };

        Self {
            profile: profile.to_string(),
            bookmarks_path: profile_dir.join(BOOKMARKS_FILE),
            history_path: profile_dir.join(HISTORY_FILE),
            icon,
        }
    }

    pub fn read_roots(&self) -> anyhow::Result<Vec<BookmarkNode>> {
        let data = std::fs::read(&self.bookmarks_path)
            .with_context(|| format!("failed to read {}", self.bookmarks_path.display()))?;
        parse_bookmark_roots(&data)
    }
}

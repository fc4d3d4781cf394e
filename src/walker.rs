//! Bookmark tree walking.
//!
//! Every folder aggregates the distinct leaf urls of its whole subtree, so a
//! url nested three folders deep counts toward each of those folders. A leaf
//! is scored once per walk no matter how many ancestors aggregate it.

use std::collections::HashSet;

use crate::bookmarks::BookmarkNode;
use crate::history::FrequencySource;
use crate::index::{BookmarkDocument, IndexError};

/// Device-level containers that never become documents.
pub const RESERVED_ROOT_NAMES: [&str; 3] = ["Bookmarks Bar", "Other Bookmarks", "Mobile Bookmarks"];

pub fn is_reserved_root(name: &str) -> bool {
    RESERVED_ROOT_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name.trim()))
}

/// Receives the documents produced by a walk.
pub trait DocumentSink {
    fn add(&mut self, doc: BookmarkDocument) -> Result<(), IndexError>;
}

impl DocumentSink for Vec<BookmarkDocument> {
    fn add(&mut self, doc: BookmarkDocument) -> Result<(), IndexError> {
        self.push(doc);
        Ok(())
    }
}

#[derive(Default)]
struct Subtree {
    urls: Vec<(String, u64)>,
    seen: HashSet<String>,
    titles: Vec<String>,
}

impl Subtree {
    fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    fn add_url(&mut self, url: String, visits: u64) {
        if self.seen.insert(url.clone()) {
            self.urls.push((url, visits));
        }
    }

    fn absorb(&mut self, nested: Subtree) {
        for (url, visits) in nested.urls {
            self.add_url(url, visits);
        }
        self.titles.extend(nested.titles);
    }

    fn visits(&self) -> u64 {
        self.urls.iter().map(|(_, visits)| visits).sum()
    }
}

pub struct Walker<'a> {
    profile: &'a str,
    icon: &'a str,
    source: &'a dyn FrequencySource,
}

impl<'a> Walker<'a> {
    pub fn new(profile: &'a str, icon: &'a str, source: &'a dyn FrequencySource) -> Self {
        Self {
            profile,
            icon,
            source,
        }
    }

    /// Walks `node` and writes one document per retained folder into `sink`.
    ///
    /// Returns the number of emitted documents. Only sink failures abort the
    /// walk; a url that cannot be scored counts as zero visits.
    pub fn walk(
        &self,
        node: &BookmarkNode,
        path: &str,
        sink: &mut dyn DocumentSink,
    ) -> Result<usize, IndexError> {
        let mut emitted = 0;
        if node.is_folder() {
            self.visit(node, path, sink, &mut emitted)?;
        }
        Ok(emitted)
    }

    fn visit(
        &self,
        node: &BookmarkNode,
        path: &str,
        sink: &mut dyn DocumentSink,
        emitted: &mut usize,
    ) -> Result<Subtree, IndexError> {
        let mut subtree = Subtree::default();

        for child in node.children.iter().flatten() {
            if child.is_folder() {
                let child_path = if path.is_empty() { child.name.as_str() } else { path };
                let nested = self.visit(child, child_path, sink, emitted)?;
                subtree.absorb(nested);
            } else if let Some(url) = &child.url {
                if !subtree.contains(url) {
                    let visits = self.score(url);
                    subtree.add_url(url.clone(), visits);
                }
                subtree.titles.push(child.name.clone());
            }
        }

        if !subtree.urls.is_empty() && !is_reserved_root(&node.name) {
            let doc = self.document(node, path, &subtree);
            if doc.frequency > 0 {
                log::debug!("freq: {} for {}", doc.frequency, doc.title);
            }
            sink.add(doc)?;
            *emitted += 1;
        }

        Ok(subtree)
    }

    fn score(&self, url: &str) -> u64 {
        match self.source.qualifying_visit_count(url) {
            Ok(visits) => visits,
            Err(err) => {
                log::error!("error counting visits for {url}: {err}");
                0
            }
        }
    }

    fn document(&self, node: &BookmarkNode, path: &str, subtree: &Subtree) -> BookmarkDocument {
        let url_count = subtree.urls.len() as u64;
        let frequency = (subtree.visits() as f64 / url_count as f64).round() as u64;

        let content = std::iter::once(node.name.as_str())
            .chain(subtree.titles.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let url = subtree
            .urls
            .iter()
            .map(|(url, _)| url.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        BookmarkDocument {
            title: node.name.clone(),
            content,
            frequency,
            url_count,
            path: path.to_string(),
            profile: self.profile.to_string(),
            url,
            icon: self.icon.to_string(),
        }
    }
}

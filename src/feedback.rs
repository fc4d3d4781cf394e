//! Launcher-facing item list.
//!
//! Every caller-visible state renders as a list of items; the placeholder
//! states ask the launcher to re-run the query shortly.

use serde::Serialize;

use crate::index::{QueryOutcome, SearchHit};

const ICON_WARNING: &str = "warning.png";
const RERUN_SECS: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Icon {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    pub valid: bool,
    pub icon: Icon,
}

impl Item {
    fn warning(title: &str, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            arg: None,
            valid: false,
            icon: Icon {
                path: ICON_WARNING.to_string(),
            },
        }
    }

    fn from_hit(hit: &SearchHit) -> Self {
        Self {
            title: hit.title.clone(),
            subtitle: format!("{} webpages ({})", hit.url_count, hit.frequency),
            arg: Some(hit.action_payload()),
            valid: true,
            icon: Icon {
                path: hit.icon.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerun: Option<f32>,
    pub items: Vec<Item>,
}

impl Feedback {
    pub fn indexing() -> Self {
        Self {
            rerun: Some(RERUN_SECS),
            items: vec![Item::warning(
                "Indexing Bookmarks",
                "Info will display when complete",
            )],
        }
    }

    pub fn from_outcome(outcome: &QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::NoBookmarks => Self {
                rerun: Some(RERUN_SECS),
                items: vec![Item::warning(
                    "No bookmarks found",
                    "bmk profile add <name> to add profiles",
                )],
            },
            QueryOutcome::NoMatches => Self {
                rerun: Some(RERUN_SECS),
                items: vec![Item::warning("No bookmarks found", "Try a different query")],
            },
            QueryOutcome::Results(hits) => Self {
                rerun: None,
                items: hits.iter().map(Item::from_hit).collect(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

//! Query execution against a published slot.
//!
//! A non-empty input always runs the prefix pass (title starts with the
//! input, ranked by frequency). Inputs longer than one char also run the
//! fuzzy n-gram pass over `content`; its hits are appended after the prefix
//! hits without duplicating any of them. An empty input browses everything
//! by frequency.
//!
//! Query terms come out of the same analyzers that indexed the titles and
//! contents, so they are lowercased, accent-folded and capped the same way.

use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::tokenizer::{TextAnalyzer, TokenStream};
use tantivy::{DocAddress, Order, Searcher, TantivyDocument, Term};

use super::schema::{edge_ngram_analyzer, title_prefix_analyzer, FREQUENCY, TITLE_PREFIX_MAX};
use super::{BookmarkIndex, IndexError};

pub const RESULT_LIMIT: usize = 20;

/// Shorter query words must match an indexed n-gram exactly
const FUZZY_MIN_WORD_CHARS: usize = 4;
const FUZZY_DISTANCE: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// Empty input
    Everything,
    Terms {
        /// `None` when the input is longer than any indexed title prefix
        prefix: Option<String>,
        /// `None` for single-char input or when no word is long enough
        fuzzy: Option<Vec<String>>,
    },
}

impl QueryPlan {
    pub fn for_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return QueryPlan::Everything;
        }

        let prefix = if trimmed.chars().count() <= TITLE_PREFIX_MAX {
            longest_prefix(&mut title_prefix_analyzer(), trimmed)
        } else {
            None
        };

        let fuzzy = if trimmed.chars().count() > 1 {
            let words = longest_ngrams(&mut edge_ngram_analyzer(), trimmed);
            (!words.is_empty()).then_some(words)
        } else {
            None
        };

        QueryPlan::Terms { prefix, fuzzy }
    }

    pub fn uses_fuzzy(&self) -> bool {
        matches!(self, QueryPlan::Terms { fuzzy: Some(_), .. })
    }
}

/// The whole-text prefix analyzer emits growing prefixes; the last one is
/// the full analyzed input.
fn longest_prefix(analyzer: &mut TextAnalyzer, text: &str) -> Option<String> {
    let mut longest = None;
    analyzer
        .token_stream(text)
        .process(&mut |token| longest = Some(token.text.clone()));
    longest
}

/// The longest indexed n-gram of every word, in word order. Words too short
/// to have an n-gram are dropped.
fn longest_ngrams(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut words: Vec<(usize, String)> = Vec::new();
    analyzer.token_stream(text).process(&mut |token| {
        if let Some((position, word)) = words.last_mut() {
            if *position == token.position {
                *word = token.text.clone();
                return;
            }
        }
        words.push((token.position, token.text.clone()));
    });
    words.into_iter().map(|(_, word)| word).collect()
}

/// Appends the unseen items of `secondary` to `primary` until it holds `cap`
/// items. Items already in `primary` keep their rank.
pub fn merge_ranked<T: Eq + Hash + Clone>(
    primary: &mut Vec<T>,
    secondary: impl IntoIterator<Item = T>,
    cap: usize,
) {
    let mut seen: HashSet<T> = primary.iter().cloned().collect();
    for item in secondary {
        if primary.len() >= cap {
            break;
        }
        if seen.insert(item.clone()) {
            primary.push(item);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub path: String,
    pub profile: String,
    pub url: String,
    pub url_count: u64,
    pub frequency: u64,
    pub icon: String,
}

impl SearchHit {
    /// `profile,title,urls` as handed to the open action
    pub fn action_payload(&self) -> String {
        format!("{},{},{}", self.profile, self.title, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The slot holds no documents at all
    NoBookmarks,
    /// Documents exist but none matched
    NoMatches,
    Results(Vec<SearchHit>),
}

pub struct QueryEngine<'a> {
    index: &'a BookmarkIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a BookmarkIndex) -> Self {
        Self { index }
    }

    pub fn search(&self, input: &str) -> Result<QueryOutcome, IndexError> {
        let reader = self.index.reader()?;
        let searcher = reader.searcher();

        if searcher.num_docs() == 0 {
            return Ok(QueryOutcome::NoBookmarks);
        }

        let plan = QueryPlan::for_input(input);
        log::debug!("query {input:?}, fuzzy pass: {}", plan.uses_fuzzy());
        let addresses = self.execute(&searcher, &plan);

        let hits: Vec<SearchHit> = addresses
            .into_iter()
            .filter_map(|address| match self.load_hit(&searcher, address) {
                Ok(hit) => Some(hit),
                Err(err) => {
                    log::warn!("failed to load stored document {address:?}: {err}");
                    None
                }
            })
            .collect();

        if hits.is_empty() {
            Ok(QueryOutcome::NoMatches)
        } else {
            Ok(QueryOutcome::Results(hits))
        }
    }

    fn execute(&self, searcher: &Searcher, plan: &QueryPlan) -> Vec<DocAddress> {
        match plan {
            QueryPlan::Everything => self.by_frequency(searcher, &AllQuery),
            QueryPlan::Terms { prefix, fuzzy } => {
                let mut ranked = match prefix {
                    Some(prefix) => self.by_frequency(searcher, &self.prefix_query(prefix)),
                    None => Vec::new(),
                };

                if let Some(words) = fuzzy {
                    let extra = self.by_relevance(searcher, &self.ngram_query(words));
                    merge_ranked(&mut ranked, extra, RESULT_LIMIT);
                }

                ranked.truncate(RESULT_LIMIT);
                ranked
            }
        }
    }

    fn prefix_query(&self, prefix: &str) -> TermQuery {
        let term = Term::from_field_text(self.index.fields().title_prefix, prefix);
        TermQuery::new(term, IndexRecordOption::Basic)
    }

    /// Conjunction of one n-gram match per query word.
    fn ngram_query(&self, words: &[String]) -> BooleanQuery {
        let content = self.index.fields().content;
        let clauses: Vec<(Occur, Box<dyn Query>)> = words
            .iter()
            .map(|word| {
                let term = Term::from_field_text(content, word);
                let query: Box<dyn Query> = if word.chars().count() >= FUZZY_MIN_WORD_CHARS {
                    Box::new(FuzzyTermQuery::new(term, FUZZY_DISTANCE, true))
                } else {
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
                };
                (Occur::Must, query)
            })
            .collect();

        BooleanQuery::new(clauses)
    }

    fn by_frequency(&self, searcher: &Searcher, query: &dyn Query) -> Vec<DocAddress> {
        let collector = TopDocs::with_limit(RESULT_LIMIT).order_by_u64_field(FREQUENCY, Order::Desc);
        match searcher.search(query, &collector) {
            Ok(top) => top.into_iter().map(|(_, address)| address).collect(),
            Err(err) => {
                log::warn!("frequency ranked search failed: {err}");
                Vec::new()
            }
        }
    }

    fn by_relevance(&self, searcher: &Searcher, query: &dyn Query) -> Vec<DocAddress> {
        match searcher.search(query, &TopDocs::with_limit(RESULT_LIMIT)) {
            Ok(top) => top.into_iter().map(|(_, address)| address).collect(),
            Err(err) => {
                log::warn!("n-gram search failed: {err}");
                Vec::new()
            }
        }
    }

    fn load_hit(&self, searcher: &Searcher, address: DocAddress) -> Result<SearchHit, IndexError> {
        let doc: TantivyDocument = searcher.doc(address)?;
        let fields = self.index.fields();

        Ok(SearchHit {
            title: fields.text(&doc, fields.title),
            path: fields.text(&doc, fields.path),
            profile: fields.text(&doc, fields.profile),
            url: fields.text(&doc, fields.url),
            url_count: fields.unsigned(&doc, fields.url_count),
            frequency: fields.unsigned(&doc, fields.frequency),
            icon: fields.text(&doc, fields.icon),
        })
    }
}

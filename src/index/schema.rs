//! Bookmark index schema.
//!
//! The schema is a plain table of field descriptors. `build_schema` turns it
//! into a tantivy schema and `register_analyzers` installs the analyzers the
//! table names, which has to happen every time an index is created or opened.
//!
//! Both analyzers lowercase and fold accents, so "ecole" finds "École". The
//! query side runs its input through the same constructors.

use serde::Serialize;
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, Schema, TextFieldIndexing, TextOptions, Value,
    STORED,
};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, TextAnalyzer};
use tantivy::{Index, TantivyDocument};

use super::tokenizer::EdgeNgramTokenizer;
use super::IndexError;

pub const TITLE: &str = "title";
pub const TITLE_PREFIX: &str = "title_prefix";
pub const CONTENT: &str = "content";
pub const FREQUENCY: &str = "frequency";
pub const URL_COUNT: &str = "url_count";
pub const PATH: &str = "path";
pub const PROFILE: &str = "profile";
pub const URL: &str = "url";
pub const ICON: &str = "icon";

pub const NGRAM_MIN: usize = 2;
pub const NGRAM_MAX: usize = 10;
/// Longest title prefix that is indexed
pub const TITLE_PREFIX_MAX: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Analyzer {
    /// Every prefix of the whole lowercased text
    TitlePrefix,
    /// Prefixes of each word, `NGRAM_MIN..=NGRAM_MAX` chars
    EdgeNgram,
}

impl Analyzer {
    pub fn name(self) -> &'static str {
        match self {
            Analyzer::TitlePrefix => "title_prefix",
            Analyzer::EdgeNgram => "edge_ngram",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text(Analyzer),
    Unsigned { fast: bool, indexed: bool },
    /// Stored verbatim, never searched
    Payload,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub stored: bool,
}

pub const BOOKMARK_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: TITLE,
        kind: FieldKind::Payload,
        stored: true,
    },
    FieldSpec {
        name: TITLE_PREFIX,
        kind: FieldKind::Text(Analyzer::TitlePrefix),
        stored: false,
    },
    FieldSpec {
        name: CONTENT,
        kind: FieldKind::Text(Analyzer::EdgeNgram),
        stored: false,
    },
    FieldSpec {
        name: FREQUENCY,
        kind: FieldKind::Unsigned {
            fast: true,
            indexed: true,
        },
        stored: true,
    },
    FieldSpec {
        name: URL_COUNT,
        kind: FieldKind::Unsigned {
            fast: false,
            indexed: false,
        },
        stored: true,
    },
    FieldSpec {
        name: PATH,
        kind: FieldKind::Payload,
        stored: true,
    },
    FieldSpec {
        name: PROFILE,
        kind: FieldKind::Payload,
        stored: true,
    },
    FieldSpec {
        name: URL,
        kind: FieldKind::Payload,
        stored: true,
    },
    FieldSpec {
        name: ICON,
        kind: FieldKind::Payload,
        stored: true,
    },
];

pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    for spec in BOOKMARK_FIELDS {
        match spec.kind {
            FieldKind::Text(analyzer) => {
                let record = match analyzer {
                    Analyzer::TitlePrefix => IndexRecordOption::Basic,
                    Analyzer::EdgeNgram => IndexRecordOption::WithFreqs,
                };
                let indexing = TextFieldIndexing::default()
                    .set_tokenizer(analyzer.name())
                    .set_index_option(record);
                let mut options = TextOptions::default().set_indexing_options(indexing);
                if spec.stored {
                    options = options.set_stored();
                }
                builder.add_text_field(spec.name, options);
            }
            FieldKind::Unsigned { fast, indexed } => {
                let mut options = NumericOptions::default();
                if spec.stored {
                    options = options.set_stored();
                }
                if fast {
                    options = options.set_fast();
                }
                if indexed {
                    options = options.set_indexed();
                }
                builder.add_u64_field(spec.name, options);
            }
            FieldKind::Payload => {
                builder.add_text_field(spec.name, STORED);
            }
        }
    }

    builder.build()
}

pub fn title_prefix_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(EdgeNgramTokenizer::whole_text(1, TITLE_PREFIX_MAX))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

pub fn edge_ngram_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(EdgeNgramTokenizer::words(NGRAM_MIN, NGRAM_MAX))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

pub fn register_analyzers(index: &Index) {
    let tokenizers = index.tokenizers();
    tokenizers.register(Analyzer::TitlePrefix.name(), title_prefix_analyzer());
    tokenizers.register(Analyzer::EdgeNgram.name(), edge_ngram_analyzer());
}

/// One document per retained bookmark folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkDocument {
    pub title: String,
    /// Folder name and leaf titles, searched by the n-gram pass only
    pub content: String,
    pub frequency: u64,
    pub url_count: u64,
    pub path: String,
    pub profile: String,
    /// Space-joined leaf urls
    pub url: String,
    pub icon: String,
}

/// Resolved field handles of an opened index.
#[derive(Clone, Copy, Debug)]
pub struct BookmarkFields {
    pub title: Field,
    pub title_prefix: Field,
    pub content: Field,
    pub frequency: Field,
    pub url_count: Field,
    pub path: Field,
    pub profile: Field,
    pub url: Field,
    pub icon: Field,
}

impl BookmarkFields {
    pub fn from_schema(schema: &Schema) -> Result<Self, IndexError> {
        Ok(Self {
            title: schema.get_field(TITLE)?,
            title_prefix: schema.get_field(TITLE_PREFIX)?,
            content: schema.get_field(CONTENT)?,
            frequency: schema.get_field(FREQUENCY)?,
            url_count: schema.get_field(URL_COUNT)?,
            path: schema.get_field(PATH)?,
            profile: schema.get_field(PROFILE)?,
            url: schema.get_field(URL)?,
            icon: schema.get_field(ICON)?,
        })
    }

    pub fn to_document(&self, doc: &BookmarkDocument) -> TantivyDocument {
        let mut out = TantivyDocument::default();
        out.add_text(self.title, &doc.title);
        out.add_text(self.title_prefix, &doc.title);
        out.add_text(self.content, &doc.content);
        out.add_u64(self.frequency, doc.frequency);
        out.add_u64(self.url_count, doc.url_count);
        out.add_text(self.path, &doc.path);
        out.add_text(self.profile, &doc.profile);
        out.add_text(self.url, &doc.url);
        out.add_text(self.icon, &doc.icon);
        out
    }

    pub fn text(&self, doc: &TantivyDocument, field: Field) -> String {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }

    pub fn unsigned(&self, doc: &TantivyDocument, field: Field) -> u64 {
        doc.get_first(field).and_then(|v| v.as_u64()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use tantivy::tokenizer::TokenStream;

    use super::*;

    #[test]
    fn test_schema_follows_table() {
        let schema = build_schema();

        for spec in BOOKMARK_FIELDS {
            let field = schema.get_field(spec.name).unwrap();
            let entry = schema.get_field_entry(field);
            assert_eq!(entry.is_stored(), spec.stored, "stored flag of {}", spec.name);
        }

        let frequency = schema.get_field_entry(schema.get_field(FREQUENCY).unwrap());
        assert!(frequency.is_fast());
        assert!(frequency.is_indexed());

        let url = schema.get_field_entry(schema.get_field(URL).unwrap());
        assert!(!url.is_indexed());

        let title = schema.get_field_entry(schema.get_field(TITLE).unwrap());
        assert!(!title.is_indexed());
    }

    fn analyze(mut analyzer: TextAnalyzer, text: &str) -> Vec<String> {
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            out.push(stream.token().text.clone());
        }
        out
    }

    #[test]
    fn test_analyzers_fold_case_and_accents() {
        assert_eq!(
            analyze(title_prefix_analyzer(), "École"),
            vec!["e", "ec", "eco", "ecol", "ecole"]
        );
        assert_eq!(
            analyze(edge_ngram_analyzer(), "Résumé Über"),
            vec!["re", "res", "resu", "resum", "resume", "ub", "ube", "uber"]
        );
    }

    #[test]
    fn test_fields_resolve() {
        let schema = build_schema();
        let fields = BookmarkFields::from_schema(&schema).unwrap();
        assert_ne!(fields.title, fields.title_prefix);
    }

    #[test]
    fn test_document_roundtrip_stored_values() {
        let schema = build_schema();
        let fields = BookmarkFields::from_schema(&schema).unwrap();
        let doc = BookmarkDocument {
            title: "Bar".to_string(),
            content: "Bar Go Docs".to_string(),
            frequency: 5,
            url_count: 2,
            path: String::new(),
            profile: "Default".to_string(),
            url: "go.dev go.dev/blog".to_string(),
            icon: "icon.png".to_string(),
        };

        let tantivy_doc = fields.to_document(&doc);

        assert_eq!(fields.text(&tantivy_doc, fields.title), "Bar");
        assert_eq!(fields.unsigned(&tantivy_doc, fields.frequency), 5);
        assert_eq!(fields.text(&tantivy_doc, fields.url), "go.dev go.dev/blog");
    }
}

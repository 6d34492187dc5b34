//! Remote document sources.
//!
//! A source yields loosely-typed [`RemoteDocument`]s one at a time. Every
//! known field is optional; extractors walk explicit fallback chains over
//! the accessors instead of probing attributes dynamically.
//!
//! `source_id` selects the implementation:
//!
//! | `source_id`            | Source                                   |
//! |------------------------|------------------------------------------|
//! | `wikipedia:<lang>`     | random MediaWiki pages with text extracts |
//! | `http(s)://…` or path  | JSON Lines dump, one object per line      |

pub mod jsonl;
pub mod wikipedia;

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, RecordError};
use serde_json::{Map, Value};
use std::collections::VecDeque;

pub use jsonl::JsonlSource;
pub use wikipedia::WikipediaSource;

/// Attributes longer than this are left out of diagnostic listings.
const DIAGNOSTIC_ATTR_MAX_CHARS: usize = 100;

/// One document pulled from a remote corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteDocument {
    pub doc_id: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    /// Every other attribute the source carried.
    pub attributes: Map<String, Value>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

impl RemoteDocument {
    pub fn doc_id(&self) -> Option<&str> {
        non_empty(&self.doc_id)
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    pub fn text(&self) -> Option<&str> {
        non_empty(&self.text)
    }

    pub fn body(&self) -> Option<&str> {
        non_empty(&self.body)
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }

    /// Primary text for token counting: `text`, then `body`.
    pub fn content(&self) -> Option<&str> {
        self.text().or_else(|| self.body())
    }

    /// List every short string attribute as `key: value` lines.
    ///
    /// Used as the body of a document that carries no text at all.
    pub fn describe_attributes(&self) -> String {
        let mut lines = vec!["No text content available. Available attributes:".to_string()];
        let known = [
            ("doc_id", &self.doc_id),
            ("title", &self.title),
            ("url", &self.url),
        ];
        for (key, value) in known {
            if let Some(v) = value.as_deref() {
                if v.chars().count() <= DIAGNOSTIC_ATTR_MAX_CHARS {
                    lines.push(format!("{key}: {v}"));
                }
            }
        }
        for (key, value) in &self.attributes {
            if let Value::String(v) = value {
                if v.chars().count() <= DIAGNOSTIC_ATTR_MAX_CHARS {
                    lines.push(format!("{key}: {v}"));
                }
            }
        }
        lines.join("\n")
    }
}

/// A stream of documents from one corpus.
pub trait DocumentSource: Send {
    /// The `source_id` this source was opened from.
    fn id(&self) -> &str;

    /// Next document, a per-document failure, or `None` when exhausted.
    fn next_document(&mut self) -> Option<Result<RemoteDocument, RecordError>>;

    /// Number of documents expected, when known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }

    /// Id of the next document if it is known before fetching it.
    fn peek_doc_id(&self) -> Option<String> {
        None
    }

    /// Advance past the next document. Returns `false` when exhausted.
    fn skip_document(&mut self) -> bool {
        self.next_document().is_some()
    }
}

/// Open the source named by `source_id`, yielding at most `limit` documents.
pub fn open_source(
    source_id: &str,
    limit: Option<usize>,
    config: &ExtractionConfig,
) -> Result<Box<dyn DocumentSource>, ExtractError> {
    if let Some(lang) = source_id.strip_prefix("wikipedia:") {
        let count = limit.unwrap_or(config.remote_max_documents);
        let source = WikipediaSource::open(lang, count, config)?;
        return Ok(Box::new(source));
    }
    if source_id.trim().is_empty() {
        return Err(ExtractError::InvalidSource {
            input: source_id.to_string(),
            reason: "empty source identifier".into(),
        });
    }
    let source = JsonlSource::open(source_id, limit, config)?;
    Ok(Box::new(source))
}

/// An in-memory source; handy for embedding callers and tests.
pub struct StaticSource {
    id: String,
    items: VecDeque<Result<RemoteDocument, RecordError>>,
}

impl StaticSource {
    pub fn new(id: impl Into<String>, items: Vec<Result<RemoteDocument, RecordError>>) -> Self {
        Self {
            id: id.into(),
            items: items.into(),
        }
    }

    pub fn from_documents(id: impl Into<String>, docs: Vec<RemoteDocument>) -> Self {
        Self::new(id, docs.into_iter().map(Ok).collect())
    }
}

impl DocumentSource for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_document(&mut self) -> Option<Result<RemoteDocument, RecordError>> {
        self.items.pop_front()
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

//! Output types: the normalized document and the per-batch summaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A scalar metadata value rendered into the front-matter block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Text(s) => f.write_str(s),
            MetaValue::Integer(n) => write!(f, "{n}"),
            // Debug keeps the trailing ".0" on whole floats
            MetaValue::Float(x) => write!(f, "{x:?}"),
            MetaValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Integer(n)
    }
}

/// Ordered key → scalar mapping. Insertion order is rendering order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata(Vec<(String, MetaValue)>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the value in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One source record normalized into identifier, metadata, and body.
///
/// Built once per record, written once, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    /// Filesystem-safe name, unique within its batch.
    pub identifier: String,
    pub metadata: Metadata,
    pub body: String,
}

/// Bounded error collector: counts everything, keeps the first `cap` messages.
#[derive(Debug, Clone, Default)]
pub struct ErrorList {
    count: usize,
    messages: Vec<String>,
    cap: usize,
}

impl ErrorList {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            count: 0,
            messages: Vec::new(),
            cap,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.count += 1;
        if self.messages.len() < self.cap {
            self.messages.push(message.into());
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn first(&self) -> Option<&str> {
        self.messages.first().map(String::as_str)
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Columns chosen for a tabular batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub content_column: String,
    pub title_column: Option<String>,
}

/// Summary of a Markdown batch (tabular or legacy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub output_dir: PathBuf,
    /// Records the extractor attempted.
    pub records_seen: usize,
    /// Files written.
    pub written: usize,
    pub error_count: usize,
    /// First few error messages; see `error_count` for the total.
    pub errors: Vec<String>,
    /// Tabular batches only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ColumnSchema>,
}

/// Overall outcome of a remote batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    /// Every attempted document succeeded (or nothing was attempted).
    Success,
    /// At least one success and at least one error.
    Partial,
    /// Documents were attempted and none succeeded.
    Failed,
}

impl ExtractionStatus {
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => ExtractionStatus::Success,
            (0, _) => ExtractionStatus::Failed,
            _ => ExtractionStatus::Partial,
        }
    }
}

/// Summary of a remote → paged-document batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub status: ExtractionStatus,
    pub source_id: String,
    pub output_dir: PathBuf,
    /// Documents pulled from the source, including failures.
    pub docs_attempted: usize,
    /// Documents materialized: newly created plus already present.
    pub docs_extracted: usize,
    pub files_created: usize,
    pub files_skipped: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
    /// First few materialized file names.
    pub files: Vec<String>,
}

/// Token statistics over a corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub source_id: String,
    pub document_count: usize,
    pub total_tokens: u64,
    pub average_tokens_per_doc: f64,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_keeps_insertion_order() {
        let mut m = Metadata::new();
        m.insert("doc_id", 1i64);
        m.insert("title", "Hello");
        m.insert("author", "Bob");
        let keys: Vec<&str> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["doc_id", "title", "author"]);
    }

    #[test]
    fn metadata_insert_replaces_existing_key() {
        let mut m = Metadata::new();
        m.insert("title", "a");
        m.insert("title", "b");
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("title"), Some(&MetaValue::Text("b".into())));
    }

    #[test]
    fn meta_value_display() {
        assert_eq!(MetaValue::Integer(2024).to_string(), "2024");
        assert_eq!(MetaValue::Float(2.0).to_string(), "2.0");
        assert_eq!(MetaValue::Float(0.25).to_string(), "0.25");
        assert_eq!(MetaValue::Bool(true).to_string(), "true");
    }

    #[test]
    fn error_list_counts_past_cap() {
        let mut errors = ErrorList::with_cap(2);
        for i in 0..5 {
            errors.push(format!("e{i}"));
        }
        assert_eq!(errors.count(), 5);
        assert_eq!(errors.first(), Some("e0"));
        assert_eq!(errors.into_messages(), vec!["e0", "e1"]);
    }

    #[test]
    fn status_from_counts() {
        assert_eq!(ExtractionStatus::from_counts(0, 0), ExtractionStatus::Success);
        assert_eq!(ExtractionStatus::from_counts(9, 0), ExtractionStatus::Success);
        assert_eq!(ExtractionStatus::from_counts(9, 1), ExtractionStatus::Partial);
        assert_eq!(ExtractionStatus::from_counts(0, 3), ExtractionStatus::Failed);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ExtractionStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}

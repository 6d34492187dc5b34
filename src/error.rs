//! Error types for the corpus2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the batch cannot proceed at all
//!   (unreadable source, no content column, empty remote catalog). Returned
//!   as `Err(ExtractError)` from the top-level `extract_*` functions.
//!
//! * [`RecordError`] — **Non-fatal**: a single record failed (null content
//!   cell, write error, renderer error, fetch error) but every other record
//!   is fine. Collected into the bounded error list of the batch summary so
//!   callers see partial success rather than losing the whole batch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the corpus2md library.
///
/// Record-level failures use [`RecordError`] and are reported in the batch
/// summary rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source exists but could not be read.
    #[error("Failed to read source '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source identifier is not a path, URL, or known catalog.
    #[error("Invalid source '{input}': {reason}")]
    InvalidSource { input: String, reason: String },

    /// HTTP URL was syntactically valid but the request failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Tabular errors ────────────────────────────────────────────────────
    /// The Parquet reader rejected the file.
    #[error("Failed to read Parquet file '{path}': {detail}")]
    Parquet { path: PathBuf, detail: String },

    /// No column could be identified as record content.
    #[error("Could not identify a column containing record content (columns: {columns:?})")]
    SchemaInference { columns: Vec<String> },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// A remote catalog returned no titles to fetch.
    #[error("Remote catalog '{source_id}' returned no documents")]
    EmptyCatalog { source_id: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the batch output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every record failed; the batch produced nothing.
    #[error("All {total} records failed.\nFirst error: {first_error}")]
    AllRecordsFailed { total: usize, first_error: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single record.
///
/// The batch continues after any of these; they are counted and the first
/// few are returned in the summary's `errors` list.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum RecordError {
    /// The content cell of a tabular row was null or not text.
    #[error("Record {ordinal}: no text in content column '{column}'")]
    MissingContent { ordinal: usize, column: String },

    /// The output file could not be written.
    #[error("Record {identifier}: failed to write output: {detail}")]
    WriteFailed { identifier: String, detail: String },

    /// The paged-document renderer rejected the record.
    #[error("Record {identifier}: rendering failed: {detail}")]
    RenderFailed { identifier: String, detail: String },

    /// Fetching the record from a remote source failed.
    #[error("Record {ordinal}: fetch failed: {detail}")]
    FetchFailed { ordinal: usize, detail: String },

    /// The record could not be decoded.
    #[error("Record {ordinal}: malformed input: {detail}")]
    Malformed { ordinal: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_inference_lists_columns() {
        let e = ExtractError::SchemaInference {
            columns: vec!["foo".into(), "bar".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("foo"), "got: {msg}");
        assert!(msg.contains("bar"), "got: {msg}");
    }

    #[test]
    fn all_records_failed_display() {
        let e = ExtractError::AllRecordsFailed {
            total: 3,
            first_error: "disk full".into(),
        };
        assert!(e.to_string().contains("All 3 records"));
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn record_error_display_names_record() {
        let e = RecordError::RenderFailed {
            identifier: "doc_42".into(),
            detail: "font error".into(),
        };
        assert!(e.to_string().contains("doc_42"));
        assert!(e.to_string().contains("font error"));
    }

    #[test]
    fn record_error_serializes() {
        let e = RecordError::FetchFailed {
            ordinal: 7,
            detail: "HTTP 503".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("FetchFailed"));
        assert!(json.contains("503"));
    }
}

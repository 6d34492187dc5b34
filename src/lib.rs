//! # corpus2md
//!
//! Normalize heterogeneous document corpora into a uniform on-disk form:
//! one Markdown file per record (front-matter metadata + body) or one paged
//! PDF per remote document.
//!
//! ## Sources
//!
//! | Extractor | Input | Output |
//! |-----------|-------|--------|
//! | [`extract_tabular`] | Parquet file (path or URL), seeded row sample | Markdown |
//! | [`extract_legacy_records`] | marker-delimited fielded text (`.I`, `.T`, `.A`, `.W`, …) | Markdown |
//! | [`extract_remote_to_paged_document`] | `wikipedia:<lang>` catalog or JSON Lines dump | PDF |
//! | [`analyze_corpus`] | any remote source | token statistics |
//!
//! ## Pipeline Overview
//!
//! ```text
//! source
//!  │
//!  ├─ 1. Input      resolve a local file or download from a URL
//!  ├─ 2. Records    Parquet rows / legacy records / remote documents
//!  ├─ 3. Identify   bounded, filesystem-safe identifier per record
//!  ├─ 4. Envelope   front-matter Markdown, or sanitized paged layout → PDF
//!  └─ 5. Sink       atomic write into the batch directory + summary
//! ```
//!
//! A record that fails is counted and skipped; the batch carries on. Only
//! problems that make the whole batch meaningless (missing source, no usable
//! content column, empty catalog) abort with an [`ExtractError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use corpus2md::{extract_legacy_records, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let summary = extract_legacy_records("CISI.ALL", "cisi_papers", &config)?;
//!     eprintln!("{} of {} records written", summary.written, summary.records_seen);
//!     Ok(())
//! }
//! ```
//!
//! The [`server`] module wraps the extractors in an asynchronous HTTP job
//! service (axum); the `corpus2md` binary exposes both.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `corpus2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! corpus2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod sources;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_corpus, analyze_source};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, RecordError};
pub use extract::{
    extract_legacy_records, extract_remote_to_paged_document, extract_remote_with,
    extract_table, extract_tabular,
};
pub use output::{
    BatchSummary, ColumnSchema, CorpusStats, ExtractionStatus, ExtractionSummary, MetaValue,
    Metadata, NormalizedDocument,
};
pub use pipeline::identifier::sanitize_identifier;
pub use pipeline::paged::{PagedDocument, PagedRenderer, PdfRenderer};
pub use pipeline::sanitize::sanitize_for_output;
pub use pipeline::tokens::{count_tokens, tokenize};
pub use progress::{ExtractionProgress, NoopProgress, ProgressCallback};
pub use sources::{open_source, DocumentSource, RemoteDocument, StaticSource};

//! Pipeline stages shared by every extractor.
//!
//! Each submodule implements one transformation step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//!  record ──▶ identifier ──▶ envelope ──▶ sink          (Markdown batches)
//!    │
//!    └──────▶ sanitize ───▶ paged ─────▶ sink          (paged batches)
//!
//!  document body ──▶ tokens                             (corpus statistics)
//! ```
//!
//! 1. [`input`]      — resolve a local path or download a URL to a temp file
//! 2. [`identifier`] — filesystem-safe, bounded identifiers from record text
//! 3. [`sanitize`]   — 1:1 character replacement into a restricted range
//! 4. [`envelope`]   — front-matter + body Markdown serialization
//! 5. [`paged`]      — title / identifier / chunked body layout and PDF rendering
//! 6. [`sink`]       — per-batch identifier reservation and atomic file writes
//! 7. [`tokens`]     — the word tokenizer behind corpus statistics

pub mod envelope;
pub mod identifier;
pub mod input;
pub mod paged;
pub mod sanitize;
pub mod sink;
pub mod tokens;

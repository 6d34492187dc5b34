//! Format-specific extractors.
//!
//! Every extractor is a blocking function that walks its records one at a
//! time, writes each to the batch directory, and returns a summary. Fatal
//! problems surface as [`ExtractError`]; a failing record is logged, counted,
//! and skipped.

pub mod legacy;
pub mod remote;
pub mod tabular;

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{BatchSummary, ColumnSchema, ErrorList};
use crate::progress::{ExtractionProgress, NoopProgress};
use std::path::PathBuf;

pub use legacy::{extract_legacy_records, parse_records, LegacyRecord};
pub use remote::{extract_remote_to_paged_document, extract_remote_with};
pub use tabular::{extract_table, extract_tabular, infer_columns, load_parquet, sample_indices, Cell, Table};

/// The configured progress listener, or a no-op one.
pub(crate) fn reporter(config: &ExtractionConfig) -> &dyn ExtractionProgress {
    match &config.progress_callback {
        Some(cb) => cb.as_ref(),
        None => &NoopProgress,
    }
}

/// Close out a Markdown batch.
///
/// A batch that attempted records but wrote none is fatal.
pub(crate) fn finish_batch(
    output_dir: PathBuf,
    records_seen: usize,
    written: usize,
    errors: ErrorList,
    schema: Option<ColumnSchema>,
    config: &ExtractionConfig,
) -> Result<BatchSummary, ExtractError> {
    reporter(config).on_batch_complete(written, errors.count());
    if written == 0 && errors.count() > 0 {
        return Err(ExtractError::AllRecordsFailed {
            total: records_seen,
            first_error: errors.first().unwrap_or("unknown error").to_string(),
        });
    }
    Ok(BatchSummary {
        output_dir,
        records_seen,
        written,
        error_count: errors.count(),
        errors: errors.into_messages(),
        schema,
    })
}

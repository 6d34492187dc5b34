//! Remote corpus → one paged document per remote document.
//!
//! Per document:
//!
//! 1. identifier `doc_{sanitized doc_id}` (or `doc_{ordinal:04}`)
//! 2. skip when the output already exists; a re-run never regenerates
//! 3. title: `title` → `URL: {url}` → `Document {id}`
//! 4. body: `text` → `body` → listing of the short string attributes
//! 5. truncate, sanitize into the renderer's character range, chunk, render
//!
//! A failure at any step is recorded and the batch moves on.

use super::reporter;
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, RecordError};
use crate::output::{ErrorList, ExtractionStatus, ExtractionSummary};
use crate::pipeline::identifier::sanitize_identifier;
use crate::pipeline::paged::{PagedDocument, PagedRenderer, PdfRenderer};
use crate::pipeline::sanitize::{sanitize_for_output, truncate_chars};
use crate::pipeline::sink::BatchWriter;
use crate::sources::{open_source, DocumentSource, RemoteDocument};
use std::path::Path;
use tracing::{debug, info, warn};

enum Outcome {
    Created(String),
    Skipped(String),
}

/// Pull up to `limit` documents (clamped to `remote_max_documents`) from
/// `source_id` and render each as a PDF under `output_dir`.
pub fn extract_remote_to_paged_document(
    output_dir: impl AsRef<Path>,
    source_id: &str,
    limit: usize,
    config: &ExtractionConfig,
) -> Result<ExtractionSummary, ExtractError> {
    let limit = config.clamp_remote_limit(limit);
    let mut source = open_source(source_id, Some(limit), config)?;
    extract_remote_with(source.as_mut(), &PdfRenderer::default(), output_dir, limit, config)
}

/// Same as [`extract_remote_to_paged_document`] over an already opened
/// source and an arbitrary renderer.
pub fn extract_remote_with(
    source: &mut dyn DocumentSource,
    renderer: &dyn PagedRenderer,
    output_dir: impl AsRef<Path>,
    limit: usize,
    config: &ExtractionConfig,
) -> Result<ExtractionSummary, ExtractError> {
    let output_dir = output_dir.as_ref();
    let limit = config.clamp_remote_limit(limit);
    let progress = reporter(config);
    let mut writer = BatchWriter::create(output_dir, renderer.extension())?;

    info!(
        "Extracting up to {} documents from '{}' to {}",
        limit,
        source.id(),
        output_dir.display()
    );
    progress.on_batch_start(source.len_hint().map(|n| n.min(limit)));

    let mut attempted = 0usize;
    let mut created = 0usize;
    let mut skipped = 0usize;
    let mut errors = ErrorList::with_cap(config.error_list_cap);
    let mut files: Vec<String> = Vec::new();

    while attempted < limit {
        let ordinal = attempted + 1;

        // Sources that know the next id up front let existing output be
        // skipped without fetching the document.
        let reserved = source
            .peek_doc_id()
            .map(|id| writer.reserve(&base_identifier(Some(&id), ordinal, config)));
        let result = match reserved {
            Some(identifier) if writer.exists(&identifier) => {
                if !source.skip_document() {
                    break;
                }
                Ok(Outcome::Skipped(identifier))
            }
            reserved => {
                let Some(item) = source.next_document() else {
                    break;
                };
                item.and_then(|doc| {
                    let identifier = reserved.unwrap_or_else(|| {
                        writer.reserve(&base_identifier(doc.doc_id(), ordinal, config))
                    });
                    convert_one(&doc, identifier, ordinal, &mut writer, renderer, config)
                })
            }
        };
        attempted = ordinal;

        match result {
            Ok(Outcome::Created(identifier)) => {
                debug!("Created {}", identifier);
                created += 1;
                progress.on_record_complete(ordinal, &identifier);
                if files.len() < config.file_list_cap {
                    files.push(format!("{identifier}.{}", renderer.extension()));
                }
            }
            Ok(Outcome::Skipped(identifier)) => {
                debug!("Skipping {}: already exists", identifier);
                skipped += 1;
                progress.on_record_skipped(ordinal, &identifier);
                if files.len() < config.file_list_cap {
                    files.push(format!("{identifier}.{}", renderer.extension()));
                }
            }
            Err(e) => {
                warn!("Document {} failed: {}", ordinal, e);
                progress.on_record_error(ordinal, &e.to_string());
                errors.push(e.to_string());
            }
        }
    }

    let extracted = created + skipped;
    let status = ExtractionStatus::from_counts(extracted, errors.count());
    info!(
        "Remote extraction finished: {} created, {} skipped, {} errors ({:?})",
        created,
        skipped,
        errors.count(),
        status
    );
    progress.on_batch_complete(extracted, errors.count());

    Ok(ExtractionSummary {
        status,
        source_id: source.id().to_string(),
        output_dir: output_dir.to_path_buf(),
        docs_attempted: attempted,
        docs_extracted: extracted,
        files_created: created,
        files_skipped: skipped,
        error_count: errors.count(),
        errors: errors.into_messages(),
        files,
    })
}

/// `doc_{sanitized id}`, or `doc_{ordinal:04}` without a usable id.
fn base_identifier(doc_id: Option<&str>, ordinal: usize, config: &ExtractionConfig) -> String {
    doc_id
        .map(|id| sanitize_identifier(id, config.max_identifier_len))
        .filter(|id| !id.is_empty())
        .map(|id| format!("doc_{id}"))
        .unwrap_or_else(|| format!("doc_{ordinal:04}"))
}

fn convert_one(
    doc: &RemoteDocument,
    identifier: String,
    ordinal: usize,
    writer: &mut BatchWriter,
    renderer: &dyn PagedRenderer,
    config: &ExtractionConfig,
) -> Result<Outcome, RecordError> {
    if writer.exists(&identifier) {
        return Ok(Outcome::Skipped(identifier));
    }

    let title = resolve_title(doc, ordinal);
    let title = sanitize_for_output(
        truncate_chars(&title, config.title_max_chars),
        config.max_code_point,
        false,
    );
    let body = match doc.text().or_else(|| doc.body()) {
        Some(text) => text.to_string(),
        None => {
            debug!("Document {} has no text; listing its attributes", identifier);
            doc.describe_attributes()
        }
    };
    let body = sanitize_for_output(
        truncate_chars(&body, config.body_max_chars),
        config.max_code_point,
        true,
    );

    let paged = PagedDocument::new(identifier.clone(), title, &body, config.chunk_chars);
    let bytes = renderer.render(&paged)?;
    writer.write(&identifier, &bytes)?;
    Ok(Outcome::Created(identifier))
}

fn resolve_title(doc: &RemoteDocument, ordinal: usize) -> String {
    if let Some(title) = doc.title() {
        return title.to_string();
    }
    if let Some(url) = doc.url() {
        return format!("URL: {url}");
    }
    match doc.doc_id() {
        Some(id) => format!("Document {id}"),
        None => format!("Document {ordinal}"),
    }
}

//! Corpus statistics: token counts streamed document by document.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::reporter;
use crate::output::{CorpusStats, ErrorList};
use crate::pipeline::tokens::count_tokens;
use crate::sources::{open_source, DocumentSource};
use tracing::{debug, info, warn};

/// Token statistics over at most `limit` documents of `source_id`.
///
/// `None` means the whole source. Remote limits are not clamped here:
/// analysis writes nothing.
pub fn analyze_corpus(
    source_id: &str,
    limit: Option<usize>,
    config: &ExtractionConfig,
) -> Result<CorpusStats, ExtractError> {
    let mut source = open_source(source_id, limit, config)?;
    Ok(analyze_source(source.as_mut(), limit, config))
}

/// Aggregate over an already opened source.
pub fn analyze_source(
    source: &mut dyn DocumentSource,
    limit: Option<usize>,
    config: &ExtractionConfig,
) -> CorpusStats {
    let progress = reporter(config);
    info!("Analyzing corpus '{}'", source.id());
    progress.on_batch_start(match (source.len_hint(), limit) {
        (Some(n), Some(l)) => Some(n.min(l)),
        (hint, None) => hint,
        (None, Some(_)) => None,
    });

    let mut seen = 0usize;
    let mut document_count = 0usize;
    let mut total_tokens = 0u64;
    let mut min_tokens: Option<usize> = None;
    let mut max_tokens = 0usize;
    let mut errors = ErrorList::with_cap(config.error_list_cap);

    while limit.map_or(true, |l| seen < l) {
        let Some(item) = source.next_document() else {
            break;
        };
        seen += 1;
        match item {
            Ok(doc) => {
                let tokens = doc.content().map_or(0, count_tokens);
                debug!("Document {}: {} tokens", seen, tokens);
                document_count += 1;
                total_tokens += tokens as u64;
                min_tokens = Some(min_tokens.map_or(tokens, |m| m.min(tokens)));
                max_tokens = max_tokens.max(tokens);
                progress.on_record_complete(seen, doc.doc_id().unwrap_or(""));
            }
            Err(e) => {
                warn!("Document {} failed: {}", seen, e);
                progress.on_record_error(seen, &e.to_string());
                errors.push(e.to_string());
            }
        }
    }

    let average_tokens_per_doc = if document_count == 0 {
        0.0
    } else {
        total_tokens as f64 / document_count as f64
    };
    info!(
        "Analyzed {} documents: {} tokens total, {:.1} average",
        document_count, total_tokens, average_tokens_per_doc
    );
    progress.on_batch_complete(document_count, errors.count());

    CorpusStats {
        source_id: source.id().to_string(),
        document_count,
        total_tokens,
        average_tokens_per_doc,
        min_tokens: min_tokens.unwrap_or(0),
        max_tokens,
        error_count: errors.count(),
        errors: errors.into_messages(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::sources::{RemoteDocument, StaticSource};

    fn text_doc(text: &str) -> RemoteDocument {
        RemoteDocument {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    #[test]
    fn aggregates_token_counts() {
        let mut src = StaticSource::from_documents(
            "mem",
            vec![text_doc("Hello, World! 123"), text_doc("one"), text_doc("a b c d e")],
        );
        let stats = analyze_source(&mut src, None, &ExtractionConfig::default());
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.total_tokens, 9);
        assert_eq!(stats.min_tokens, 1);
        assert_eq!(stats.max_tokens, 5);
        assert!((stats.average_tokens_per_doc - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_corpus_defaults_to_zero() {
        let mut src = StaticSource::from_documents("mem", vec![]);
        let stats = analyze_source(&mut src, None, &ExtractionConfig::default());
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.min_tokens, 0);
        assert_eq!(stats.max_tokens, 0);
        assert_eq!(stats.average_tokens_per_doc, 0.0);
    }

    #[test]
    fn errors_do_not_stop_aggregation() {
        let mut src = StaticSource::new(
            "mem",
            vec![
                Ok(text_doc("two words")),
                Err(RecordError::FetchFailed {
                    ordinal: 2,
                    detail: "timeout".into(),
                }),
                Ok(text_doc("four words right here")),
            ],
        );
        let stats = analyze_source(&mut src, None, &ExtractionConfig::default());
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.error_count, 1);
        assert!((stats.average_tokens_per_doc - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn limit_stops_early() {
        let docs = (0..10).map(|_| text_doc("x")).collect();
        let mut src = StaticSource::from_documents("mem", docs);
        let stats = analyze_source(&mut src, Some(4), &ExtractionConfig::default());
        assert_eq!(stats.document_count, 4);
    }

    #[test]
    fn documents_without_text_count_zero_tokens() {
        let mut src = StaticSource::from_documents("mem", vec![RemoteDocument::default(), text_doc("a b")]);
        let stats = analyze_source(&mut src, None, &ExtractionConfig::default());
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.min_tokens, 0);
        assert_eq!(stats.max_tokens, 2);
    }
}

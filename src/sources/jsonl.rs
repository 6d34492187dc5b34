//! JSON Lines dump: one JSON object per line, read lazily.
//!
//! Recognised keys are `doc_id` (or `id`), `title`, `text`, `body` and `url`;
//! string or numeric ids are both accepted. Everything else is kept in
//! [`RemoteDocument::attributes`]. Blank lines are skipped; a line that is
//! not a JSON object is a per-document error.

use super::{DocumentSource, RemoteDocument};
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, RecordError};
use crate::pipeline::input::{resolve_input, ResolvedInput};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use tracing::info;

pub struct JsonlSource {
    id: String,
    lines: Lines<BufReader<File>>,
    remaining: Option<usize>,
    ordinal: usize,
    // Keeps a downloaded dump alive until the source is dropped.
    _input: ResolvedInput,
}

impl JsonlSource {
    /// Open a local path or URL. `limit` caps the number of yielded items.
    pub fn open(
        location: &str,
        limit: Option<usize>,
        config: &ExtractionConfig,
    ) -> Result<Self, ExtractError> {
        let input = resolve_input(location, config.download_timeout_secs)?;
        let file = File::open(input.path()).map_err(|source| ExtractError::SourceRead {
            path: input.path().to_path_buf(),
            source,
        })?;
        info!("Reading JSON Lines dump: {}", location);
        Ok(Self {
            id: location.to_string(),
            lines: BufReader::new(file).lines(),
            remaining: limit,
            ordinal: 0,
            _input: input,
        })
    }
}

impl DocumentSource for JsonlSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_document(&mut self) -> Option<Result<RemoteDocument, RecordError>> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let line = self.lines.next()?;
            self.ordinal += 1;
            let ordinal = self.ordinal;
            let item = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => parse_line(&line, ordinal),
                Err(e) => Err(RecordError::FetchFailed {
                    ordinal,
                    detail: e.to_string(),
                }),
            };
            if let Some(n) = self.remaining.as_mut() {
                *n -= 1;
            }
            return Some(item);
        }
    }
}

/// Decode one JSON Lines entry.
pub fn parse_line(line: &str, ordinal: usize) -> Result<RemoteDocument, RecordError> {
    let malformed = |detail: String| RecordError::Malformed { ordinal, detail };
    let value: Value = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(malformed("expected a JSON object".into()));
    };
    Ok(document_from_map(map))
}

fn document_from_map(mut map: Map<String, Value>) -> RemoteDocument {
    let doc_id = take_scalar(&mut map, "doc_id").or_else(|| take_scalar(&mut map, "id"));
    RemoteDocument {
        doc_id,
        title: take_string(&mut map, "title"),
        text: take_string(&mut map, "text"),
        body: take_string(&mut map, "body"),
        url: take_string(&mut map, "url"),
        attributes: map,
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !map.get(key)?.is_string() {
        return None;
    }
    match map.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn take_scalar(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    let s = match map.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    map.remove(key);
    Some(s)
}

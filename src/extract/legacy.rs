//! Legacy fielded-record corpus (CISI-style) to Markdown.
//!
//! ```text
//! .I 1
//! .T
//! A title that may span
//! several lines
//! .A
//! Author, A.
//! .W
//! Body text ...
//! .X
//! cross references (dropped)
//! ```
//!
//! A record starts at a `.I <digits>` line. Inside a record, a `.<LETTER>`
//! line opens a section; anything after the letter on that line is the
//! section's first line. Lines accumulate into the open section until the
//! next marker. A code seen twice appends to its first occurrence. Lines
//! before the first marker of a record belong to no section and are
//! dropped.

use super::{finish_batch, reporter};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{BatchSummary, ErrorList, MetaValue, Metadata, NormalizedDocument};
use crate::pipeline::envelope::render_markdown;
use crate::pipeline::identifier::sanitize_identifier;
use crate::pipeline::input::resolve_local;
use crate::pipeline::sink::BatchWriter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

static RE_RECORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\.I[ \t]+(\d+)[ \t]*\r?$").unwrap());
static RE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.([A-Z])(?:[ \t]+(.*))?$").unwrap());

pub const TITLE_CODE: &str = "T";
pub const AUTHOR_CODE: &str = "A";
pub const BODY_CODE: &str = "W";
/// Cross-references never reach the output.
pub const XREF_CODE: &str = "X";

/// One parsed record: its id and its sections in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub id: String,
    pub sections: Vec<(String, String)>,
}

impl LegacyRecord {
    pub fn section(&self, code: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, text)| text.as_str())
    }

    pub fn title(&self) -> String {
        self.section(TITLE_CODE)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Document {}", self.id))
    }

    pub fn author(&self) -> String {
        self.section(AUTHOR_CODE)
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown")
            .to_string()
    }

    pub fn body(&self) -> &str {
        self.section(BODY_CODE).unwrap_or("")
    }

    /// Sections that become extra metadata entries.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .iter()
            .filter(|(code, _)| ![TITLE_CODE, AUTHOR_CODE, BODY_CODE, XREF_CODE].contains(&code.as_str()))
            .map(|(code, text)| (code.as_str(), text.as_str()))
    }

    fn to_document(&self, max_identifier_len: usize) -> NormalizedDocument {
        let title = self.title();
        let safe_title = sanitize_identifier(&title, max_identifier_len);
        let identifier = if safe_title.is_empty() {
            format!("cisi_{:0>4}", self.id)
        } else {
            format!("cisi_{:0>4}_{}", self.id, safe_title)
        };

        let mut metadata = Metadata::new();
        let doc_id = match self.id.parse::<i64>() {
            Ok(n) => MetaValue::Integer(n),
            Err(_) => MetaValue::Text(self.id.clone()),
        };
        metadata.insert("doc_id", doc_id);
        metadata.insert("title", title);
        metadata.insert("author", self.author());
        for (code, text) in self.extras() {
            metadata.insert(code, text);
        }

        NormalizedDocument {
            identifier,
            metadata,
            body: self.body().to_string(),
        }
    }
}

/// Split a whole corpus into records.
pub fn parse_records(text: &str) -> Vec<LegacyRecord> {
    let starts: Vec<(usize, usize, String)> = RE_RECORD_START
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[1].to_string()))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (_, blob_start, id))| {
            let blob_end = starts.get(i + 1).map_or(text.len(), |next| next.0);
            LegacyRecord {
                id: id.clone(),
                sections: parse_sections(&text[*blob_start..blob_end]),
            }
        })
        .collect()
}

/// Line-oriented scan of one record's blob.
fn parse_sections(blob: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<usize> = None;

    for raw in blob.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(caps) = RE_SECTION.captures(line) {
            let code = caps[1].to_string();
            let idx = match sections.iter().position(|(c, _)| *c == code) {
                Some(idx) => idx,
                None => {
                    sections.push((code, Vec::new()));
                    sections.len() - 1
                }
            };
            if let Some(inline) = caps.get(2).map(|m| m.as_str().trim()).filter(|s| !s.is_empty()) {
                sections[idx].1.push(inline.to_string());
            }
            current = Some(idx);
        } else if let Some(idx) = current {
            sections[idx].1.push(line.to_string());
        }
    }

    sections
        .into_iter()
        .map(|(code, lines)| (code, lines.join("\n").trim().to_string()))
        .collect()
}

/// Convert every record of a legacy corpus file into Markdown files.
pub fn extract_legacy_records(
    source_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<BatchSummary, ExtractError> {
    let source_path = resolve_local(source_path.as_ref())?;
    let output_dir = output_dir.as_ref();
    let progress = reporter(config);

    info!("Reading legacy corpus: {}", source_path.display());
    let bytes = std::fs::read(&source_path).map_err(|source| ExtractError::SourceRead {
        path: source_path.clone(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let records = parse_records(&text);
    info!("Found {} records", records.len());
    progress.on_message(&format!("Found {} records", records.len()));
    progress.on_batch_start(Some(records.len()));

    let mut writer = BatchWriter::create(output_dir, "md")?;
    let mut written = 0usize;
    let mut errors = ErrorList::with_cap(config.error_list_cap);

    for (i, record) in records.iter().enumerate() {
        let ordinal = i + 1;
        let doc = record.to_document(config.max_identifier_len);
        let identifier = writer.reserve(&doc.identifier);
        match writer.write(&identifier, render_markdown(&doc).as_bytes()) {
            Ok(_) => {
                debug!("Wrote record {} as {}", record.id, identifier);
                written += 1;
                progress.on_record_complete(ordinal, &identifier);
            }
            Err(e) => {
                warn!("Record {} failed: {}", record.id, e);
                progress.on_record_error(ordinal, &e.to_string());
                errors.push(e.to_string());
            }
        }
    }

    info!("Extracted {} of {} records to {}", written, records.len(), output_dir.display());
    finish_batch(
        output_dir.to_path_buf(),
        records.len(),
        written,
        errors,
        None,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
.I 1
.T
18 Editions of the Dewey Decimal Classifications
.A
Comaromi, J.P.
.W
    The present study is a history of the DEWEY Decimal
Classification.
.X
1\t5\t1
.I 2
.T
Use Made of Technical Libraries
.A
Slater, M.
.B
1969
.W
This report is an analysis of 6300 acts of use.
";

    #[test]
    fn splits_records_and_sections() {
        let records = parse_records(SAMPLE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].title(), "18 Editions of the Dewey Decimal Classifications");
        assert_eq!(records[0].author(), "Comaromi, J.P.");
        assert_eq!(
            records[0].body(),
            "The present study is a history of the DEWEY Decimal\nClassification."
        );
        assert_eq!(records[1].section("B"), Some("1969"));
    }

    #[test]
    fn inline_section_text() {
        let records = parse_records(".I 1\n.T Hello\n.A Bob\n.W Body text\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title(), "Hello");
        assert_eq!(records[0].author(), "Bob");
        assert_eq!(records[0].body(), "Body text");
    }

    #[test]
    fn defaults_when_sections_missing() {
        let records = parse_records(".I 7\n.B\n1970\n");
        let r = &records[0];
        assert_eq!(r.title(), "Document 7");
        assert_eq!(r.author(), "Unknown");
        assert_eq!(r.body(), "");
    }

    #[test]
    fn xref_is_excluded_from_extras() {
        let records = parse_records(SAMPLE);
        let extras: Vec<_> = records[0].extras().collect();
        assert!(extras.is_empty());
        let extras: Vec<_> = records[1].extras().collect();
        assert_eq!(extras, vec![("B", "1969")]);
    }

    #[test]
    fn repeated_codes_append() {
        let records = parse_records(".I 1\n.W\nfirst\n.B\nx\n.W\nsecond\n");
        assert_eq!(records[0].body(), "first\nsecond");
        let codes: Vec<&str> = records[0].sections.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["W", "B"]);
    }

    #[test]
    fn ignores_prefix_and_text_before_first_marker() {
        let records = parse_records("garbage header\n.I 3\nstray line\n.T\nT\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sections, vec![("T".to_string(), "T".to_string())]);
    }

    #[test]
    fn crlf_input() {
        let records = parse_records(".I 1\r\n.T\r\nWindows\r\n.W\r\nLine\r\n");
        assert_eq!(records[0].title(), "Windows");
        assert_eq!(records[0].body(), "Line");
    }

    #[test]
    fn non_letter_dot_lines_are_content() {
        let records = parse_records(".I 1\n.W\n.5 percent of users\n");
        assert_eq!(records[0].body(), ".5 percent of users");
    }

    #[test]
    fn no_records_in_empty_input() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("no markers here").is_empty());
    }

    #[test]
    fn document_identifier_and_front_matter() {
        let records = parse_records(SAMPLE);
        let doc = records[1].to_document(100);
        assert_eq!(doc.identifier, "cisi_0002_Use_Made_of_Technical_Libraries");
        let md = render_markdown(&doc);
        assert_eq!(
            md,
            "---\ndoc_id: 2\ntitle: Use Made of Technical Libraries\nauthor: Slater, M.\nB: 1969\n---\n\n\
             This report is an analysis of 6300 acts of use."
        );
    }

    #[test]
    fn extract_writes_one_file_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("CISI.ALL");
        std::fs::write(&src, SAMPLE).unwrap();
        let out = tmp.path().join("out");
        let summary = extract_legacy_records(&src, &out, &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.records_seen, 2);
        assert_eq!(summary.written, 2);
        assert!(out.join("cisi_0001_18_Editions_of_the_Dewey_Decimal_Classifications.md").is_file());
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("bad.txt");
        let mut bytes = b".I 1\n.T\nCaf".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"\n.W\nok\n");
        std::fs::write(&src, bytes).unwrap();
        let summary =
            extract_legacy_records(&src, tmp.path().join("out"), &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.written, 1);
    }

    #[test]
    fn duplicate_records_get_suffixes() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("dup.txt");
        std::fs::write(&src, ".I 1\n.T Same\n.I 1\n.T Same\n").unwrap();
        let out = tmp.path().join("out");
        let summary = extract_legacy_records(&src, &out, &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.written, 2);
        assert!(out.join("cisi_0001_Same.md").is_file());
        assert!(out.join("cisi_0001_Same_2.md").is_file());
    }

    #[test]
    fn missing_source_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_legacy_records("/no/such/file", tmp.path(), &ExtractionConfig::default())
            .unwrap_err();
        assert!(matches!(err, ExtractError::SourceNotFound { .. }));
    }
}

//! Tabular extraction: one Markdown file per sampled Parquet row.
//!
//! ## Column inference
//!
//! The content column is the first of [`CONTENT_CANDIDATES`] present in the
//! schema. Failing that, the first column whose first non-empty value is a
//! string longer than `content_min_chars`. No content column is fatal before
//! any row is touched. The title column is the first of
//! [`TITLE_CANDIDATES`] present; without one, files are numbered.
//!
//! ## Sampling
//!
//! Asking for at least as many rows as exist takes every row in stored
//! order. Otherwise exactly `sample_size` distinct indices are drawn with a
//! `StdRng` seeded from `seed`, and rows are written in drawn order, so the
//! same file and seed always produce the same batch.

use super::{finish_batch, reporter};
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, RecordError};
use crate::output::{BatchSummary, ColumnSchema, ErrorList, MetaValue, Metadata, NormalizedDocument};
use crate::pipeline::envelope::render_markdown;
use crate::pipeline::identifier::sanitize_identifier;
use crate::pipeline::input::resolve_input;
use crate::pipeline::sink::BatchWriter;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

pub const CONTENT_CANDIDATES: [&str; 5] = ["text", "content", "markdown", "mmd", "body"];
pub const TITLE_CANDIDATES: [&str; 3] = ["title", "name", "paper_title"];

// ── In-memory table ──────────────────────────────────────────────────────

static NULL_CELL: Cell = Cell::Null;

/// One scalar cell of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Binary,
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Nested or temporal values, kept in their display form.
    Other(String),
}

impl Cell {
    fn is_empty(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Display form used for titles and non-text content.
    fn display(&self) -> Option<String> {
        match self {
            Cell::Null | Cell::Binary => None,
            Cell::Text(s) | Cell::Other(s) => Some(s.clone()),
            Cell::Integer(n) => Some(n.to_string()),
            Cell::Float(x) => Some(format!("{x:?}")),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&Field> for Cell {
    fn from(field: &Field) -> Self {
        match field {
            Field::Null => Cell::Null,
            Field::Str(s) => Cell::Text(s.clone()),
            Field::Bytes(_) => Cell::Binary,
            Field::Bool(b) => Cell::Bool(*b),
            Field::Byte(n) => Cell::Integer(i64::from(*n)),
            Field::Short(n) => Cell::Integer(i64::from(*n)),
            Field::Int(n) => Cell::Integer(i64::from(*n)),
            Field::Long(n) => Cell::Integer(*n),
            Field::UByte(n) => Cell::Integer(i64::from(*n)),
            Field::UShort(n) => Cell::Integer(i64::from(*n)),
            Field::UInt(n) => Cell::Integer(i64::from(*n)),
            Field::ULong(n) => match i64::try_from(*n) {
                Ok(v) => Cell::Integer(v),
                Err(_) => Cell::Other(n.to_string()),
            },
            // Widen through the shortest f32 repr so 0.1f32 stays 0.1
            Field::Float(x) => Cell::Float(x.to_string().parse().unwrap_or(f64::from(*x))),
            Field::Double(x) => Cell::Float(*x),
            other => Cell::Other(other.to_string()),
        }
    }
}

/// A fully loaded table: column names plus rows of cells in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL_CELL)
    }
}

/// Read every row of a Parquet file into memory.
pub fn load_parquet(path: &Path) -> Result<Table, ExtractError> {
    let parquet_err = |e: parquet::errors::ParquetError| ExtractError::Parquet {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let file = File::open(path).map_err(|source| ExtractError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = SerializedFileReader::new(file).map_err(parquet_err)?;

    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let mut rows = Vec::new();
    for row in reader.get_row_iter(None).map_err(parquet_err)? {
        let row = row.map_err(parquet_err)?;
        let mut cells = vec![Cell::Null; columns.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(idx) = columns.iter().position(|c| c == name) {
                cells[idx] = Cell::from(field);
            }
        }
        rows.push(cells);
    }

    debug!("Loaded {} rows x {} columns from {}", rows.len(), columns.len(), path.display());
    Ok(Table { columns, rows })
}

// ── Inference and sampling ───────────────────────────────────────────────

/// Resolve the content and title columns of `table`.
pub fn infer_columns(table: &Table, content_min_chars: usize) -> Result<ColumnSchema, ExtractError> {
    let content_column = CONTENT_CANDIDATES
        .iter()
        .find(|c| table.column_index(c).is_some())
        .map(|c| c.to_string())
        .or_else(|| {
            table
                .columns
                .iter()
                .enumerate()
                .find(|(idx, _)| {
                    let first = table
                        .rows
                        .iter()
                        .map(|r| r.get(*idx).unwrap_or(&NULL_CELL))
                        .find(|c| !c.is_empty());
                    matches!(first, Some(Cell::Text(s)) if s.chars().count() > content_min_chars)
                })
                .map(|(_, name)| name.clone())
        })
        .ok_or_else(|| ExtractError::SchemaInference {
            columns: table.columns.clone(),
        })?;

    let title_column = TITLE_CANDIDATES
        .iter()
        .find(|c| table.column_index(c).is_some())
        .map(|c| c.to_string());

    Ok(ColumnSchema {
        content_column,
        title_column,
    })
}

/// Row indices to extract, in processing order.
pub fn sample_indices(total: usize, sample_size: usize, seed: u64) -> Vec<usize> {
    if sample_size >= total {
        return (0..total).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, total, sample_size).into_vec()
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Extract up to `sample_size` rows of a Parquet file (path or URL) into
/// Markdown files under `output_dir`.
pub fn extract_tabular(
    source: &str,
    output_dir: impl AsRef<Path>,
    sample_size: usize,
    seed: u64,
    config: &ExtractionConfig,
) -> Result<BatchSummary, ExtractError> {
    info!("Loading tabular source: {}", source);
    let input = resolve_input(source, config.download_timeout_secs)?;
    let table = load_parquet(input.path())?;
    extract_table(&table, output_dir.as_ref(), sample_size, seed, config)
}

/// Extract from an already loaded table.
pub fn extract_table(
    table: &Table,
    output_dir: &Path,
    sample_size: usize,
    seed: u64,
    config: &ExtractionConfig,
) -> Result<BatchSummary, ExtractError> {
    let progress = reporter(config);
    info!("Columns in the dataset: {:?}", table.columns);

    let schema = infer_columns(table, config.content_min_chars)?;
    info!(
        "Using '{}' as the content column (title column: {:?})",
        schema.content_column, schema.title_column
    );
    progress.on_message(&format!("Using '{}' as the content column", schema.content_column));

    let mut writer = BatchWriter::create(output_dir, "md")?;

    let indices = sample_indices(table.rows.len(), sample_size, seed);
    if indices.len() < sample_size {
        warn!(
            "Only {} rows available; extracting all of them",
            table.rows.len()
        );
    }
    info!("Extracting {} rows to {}", indices.len(), output_dir.display());
    progress.on_batch_start(Some(indices.len()));

    let content_idx = table.column_index(&schema.content_column);
    let title_idx = schema.title_column.as_deref().and_then(|t| table.column_index(t));

    let mut written = 0usize;
    let mut errors = ErrorList::with_cap(config.error_list_cap);

    for (i, &row) in indices.iter().enumerate() {
        let ordinal = i + 1;
        let result = build_document(table, row, ordinal, content_idx, title_idx, &schema, config)
            .and_then(|doc| {
                let identifier = writer.reserve(&doc.identifier);
                writer
                    .write(&identifier, render_markdown(&doc).as_bytes())
                    .map(|_| identifier)
            });
        match result {
            Ok(identifier) => {
                debug!("Wrote row {} as {}", row, identifier);
                written += 1;
                progress.on_record_complete(ordinal, &identifier);
            }
            Err(e) => {
                warn!("Row {} failed: {}", row, e);
                progress.on_record_error(ordinal, &e.to_string());
                errors.push(e.to_string());
            }
        }
    }

    info!("Extracted {} of {} rows to {}", written, indices.len(), output_dir.display());
    finish_batch(
        output_dir.to_path_buf(),
        indices.len(),
        written,
        errors,
        Some(schema),
        config,
    )
}

fn build_document(
    table: &Table,
    row: usize,
    ordinal: usize,
    content_idx: Option<usize>,
    title_idx: Option<usize>,
    schema: &ColumnSchema,
    config: &ExtractionConfig,
) -> Result<NormalizedDocument, RecordError> {
    let missing = || RecordError::MissingContent {
        ordinal,
        column: schema.content_column.clone(),
    };
    let content_idx = content_idx.ok_or_else(missing)?;
    let body = table.cell(row, content_idx).display().ok_or_else(missing)?;

    let title = title_idx
        .and_then(|t| table.cell(row, t).display())
        .map(|t| sanitize_identifier(&t, config.max_identifier_len))
        .unwrap_or_default();
    let identifier = if title.is_empty() {
        format!("paper_{ordinal:04}")
    } else {
        format!("{ordinal:04}_{title}")
    };

    let mut metadata = Metadata::new();
    for (idx, column) in table.columns.iter().enumerate() {
        if idx == content_idx {
            continue;
        }
        let value = match table.cell(row, idx) {
            Cell::Null | Cell::Binary => continue,
            Cell::Float(x) if x.is_nan() => continue,
            Cell::Text(s) => {
                if config.max_metadata_text_len.is_some_and(|max| s.chars().count() >= max) {
                    continue;
                }
                MetaValue::Text(s.clone())
            }
            Cell::Integer(n) => MetaValue::Integer(*n),
            Cell::Float(x) => MetaValue::Float(*x),
            Cell::Bool(b) => MetaValue::Bool(*b),
            Cell::Other(s) => MetaValue::Text(s.clone()),
        };
        metadata.insert(column.clone(), value);
    }

    Ok(NormalizedDocument {
        identifier,
        metadata,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn content_candidate_priority() {
        let t = table(&["body", "text", "title"], vec![]);
        let schema = infer_columns(&t, 100).unwrap();
        assert_eq!(schema.content_column, "text");
        assert_eq!(schema.title_column.as_deref(), Some("title"));
    }

    #[test]
    fn fallback_to_long_string_column() {
        let long = "x".repeat(150);
        let t = table(
            &["foo", "bar"],
            vec![vec![text("short"), text(&long)], vec![text("s"), text(&long)]],
        );
        let schema = infer_columns(&t, 100).unwrap();
        assert_eq!(schema.content_column, "bar");
        assert_eq!(schema.title_column, None);
    }

    #[test]
    fn fallback_skips_leading_empty_values() {
        let long = "y".repeat(101);
        let t = table(&["foo"], vec![vec![Cell::Null], vec![text("")], vec![text(&long)]]);
        assert_eq!(infer_columns(&t, 100).unwrap().content_column, "foo");
    }

    #[test]
    fn no_content_column_is_schema_error() {
        let t = table(&["foo", "bar"], vec![vec![text("a"), Cell::Integer(1)]]);
        let err = infer_columns(&t, 100).unwrap_err();
        match err {
            ExtractError::SchemaInference { columns } => assert_eq!(columns, vec!["foo", "bar"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sampling_is_seeded_and_distinct() {
        let a = sample_indices(100, 10, 42);
        let b = sample_indices(100, 10, 42);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 10);
        assert!(a.iter().all(|&i| i < 100));
    }

    #[test]
    fn oversized_sample_takes_all_in_order() {
        assert_eq!(sample_indices(3, 3, 1), vec![0, 1, 2]);
        assert_eq!(sample_indices(3, 1000, 1), vec![0, 1, 2]);
        assert!(sample_indices(0, 5, 1).is_empty());
    }

    #[test]
    fn writes_front_matter_and_identifiers() {
        let tmp = tempfile::tempdir().unwrap();
        let t = table(
            &["title", "text", "year", "blob", "note"],
            vec![
                vec![text("Attention Is All"), text("Body one"), Cell::Integer(2017), Cell::Binary, Cell::Null],
                vec![Cell::Null, text("Body two"), Cell::Integer(2020), Cell::Binary, text("n")],
            ],
        );
        let summary = extract_table(&t, tmp.path(), 10, 42, &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.written, 2);
        assert_eq!(summary.error_count, 0);

        let first = std::fs::read_to_string(tmp.path().join("0001_Attention_Is_All.md")).unwrap();
        assert_eq!(
            first,
            "---\ntitle: Attention Is All\nyear: 2017\n---\n\nBody one"
        );
        let second = std::fs::read_to_string(tmp.path().join("paper_0002.md")).unwrap();
        assert_eq!(second, "---\nyear: 2020\nnote: n\n---\n\nBody two");
    }

    #[test]
    fn long_metadata_strings_are_kept_unless_capped() {
        let tmp = tempfile::tempdir().unwrap();
        let abstract_text = "a".repeat(1500);
        let t = table(&["text", "abstract"], vec![vec![text("body"), text(&abstract_text)]]);

        extract_table(&t, tmp.path(), 1, 0, &ExtractionConfig::default()).unwrap();
        let kept = std::fs::read_to_string(tmp.path().join("paper_0001.md")).unwrap();
        assert!(kept.contains(&abstract_text));

        let capped = ExtractionConfig::builder()
            .max_metadata_text_len(Some(1000))
            .build()
            .unwrap();
        let out = tmp.path().join("capped");
        extract_table(&t, &out, 1, 0, &capped).unwrap();
        let dropped = std::fs::read_to_string(out.join("paper_0001.md")).unwrap();
        assert!(!dropped.contains("abstract:"));
    }

    #[test]
    fn null_content_is_a_record_error() {
        let tmp = tempfile::tempdir().unwrap();
        let t = table(
            &["text"],
            vec![vec![text("fine")], vec![Cell::Null], vec![Cell::Binary]],
        );
        let summary = extract_table(&t, tmp.path(), 10, 0, &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(summary.error_count, 2);
        assert!(summary.errors[0].contains("content column 'text'"));
    }

    #[test]
    fn every_row_failing_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let t = table(&["text"], vec![vec![Cell::Null], vec![Cell::Null]]);
        let err = extract_table(&t, tmp.path(), 10, 0, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractError::AllRecordsFailed { total: 2, .. }));
    }

    #[test]
    fn same_titles_stay_distinct_by_ordinal() {
        let tmp = tempfile::tempdir().unwrap();
        let t = table(
            &["name", "content"],
            vec![vec![text("Same"), text("a")], vec![text("Same"), text("b")]],
        );
        extract_table(&t, tmp.path(), 10, 0, &ExtractionConfig::default()).unwrap();
        assert!(tmp.path().join("0001_Same.md").is_file());
        assert!(tmp.path().join("0002_Same.md").is_file());
    }

    #[test]
    fn missing_parquet_file() {
        let err = load_parquet(Path::new("/nope/x.parquet")).unwrap_err();
        assert!(matches!(err, ExtractError::SourceRead { .. }));
    }

    #[test]
    fn garbage_file_is_parquet_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.parquet");
        std::fs::write(&path, b"definitely not parquet").unwrap();
        let err = load_parquet(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Parquet { .. }));
    }

    #[test]
    fn float_metadata_skips_nan_and_keeps_f32_precision() {
        let schema = ColumnSchema {
            content_column: "text".into(),
            title_column: None,
        };
        let t = table(
            &["text", "score", "gap"],
            vec![vec![
                text("body"),
                Cell::from(&Field::Float(0.1f32)),
                Cell::from(&Field::Double(f64::NAN)),
            ]],
        );
        let doc = build_document(&t, 0, 1, Some(0), None, &schema, &ExtractionConfig::default()).unwrap();
        assert_eq!(render_markdown(&doc), "---\nscore: 0.1\n---\n\nbody");
    }
}

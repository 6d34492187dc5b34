//! Fixed-layout paged output.
//!
//! A [`PagedDocument`] is a title line, an identifier line, then the body as
//! a sequence of fixed-size character windows. Renderers lay the windows out
//! one after another, breaking onto new pages as needed. Window boundaries
//! carry no meaning beyond bounding how much text one call hands the
//! renderer.

use crate::error::RecordError;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::io::BufWriter;

/// Text ready for paged rendering. All fields are already sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedDocument {
    pub identifier: String,
    pub title: String,
    pub chunks: Vec<String>,
}

impl PagedDocument {
    /// Split `body` into windows of at most `chunk_chars` characters.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, body: &str, chunk_chars: usize) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            chunks: chunk_by_chars(body, chunk_chars.max(1)),
        }
    }

    /// The line printed under the title.
    pub fn identifier_line(&self) -> String {
        format!("ID: {}", self.identifier)
    }
}

/// Split into consecutive windows of `size` characters. No word-boundary
/// handling: the last window may be shorter, an empty input gives no windows.
pub fn chunk_by_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Produces the bytes of one paged file.
pub trait PagedRenderer: Send + Sync {
    /// File extension of the produced output, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, doc: &PagedDocument) -> Result<Vec<u8>, RecordError>;
}

// ── PDF renderer ─────────────────────────────────────────────────────────

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TITLE_SIZE: f32 = 16.0;
const ID_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 10.0;
const LINE_STEP: f32 = 4.8;

/// A4 PDF in builtin Helvetica, which only covers 7-bit text.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    /// Wrap width of body lines, in characters.
    pub wrap_chars: usize,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self { wrap_chars: 95 }
    }
}

impl PagedRenderer for PdfRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, doc: &PagedDocument) -> Result<Vec<u8>, RecordError> {
        let fail = |detail: String| RecordError::RenderFailed {
            identifier: doc.identifier.clone(),
            detail,
        };

        let (pdf, page, layer) = PdfDocument::new(&doc.title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| fail(format!("font error: {e}")))?;
        let bold = pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| fail(format!("font error: {e}")))?;

        let mut cursor = Cursor {
            pdf: &pdf,
            layer: pdf.get_page(page).get_layer(layer),
            y: PAGE_H - MARGIN,
        };

        for line in wrap_text(&doc.title, self.wrap_chars * 10 / 16) {
            cursor.line(&line, TITLE_SIZE, &bold, 7.0);
        }
        cursor.line(&doc.identifier_line(), ID_SIZE, &font, 8.0);

        for chunk in &doc.chunks {
            for raw in chunk.split('\n') {
                for line in wrap_text(raw, self.wrap_chars) {
                    cursor.line(&line, BODY_SIZE, &font, LINE_STEP);
                }
            }
        }

        let mut buf = BufWriter::new(Vec::new());
        pdf.save(&mut buf).map_err(|e| fail(format!("save error: {e}")))?;
        buf.into_inner().map_err(|e| fail(format!("buffer error: {e}")))
    }
}

struct Cursor<'a> {
    pdf: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor<'_> {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef, step: f32) {
        if self.y - step < MARGIN {
            let (page, layer) = self.pdf.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            self.layer = self.pdf.get_page(page).get_layer(layer);
            self.y = PAGE_H - MARGIN;
        }
        if !text.is_empty() {
            self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        }
        self.y -= step;
    }
}

/// Greedy word wrap; words longer than `max_chars` are hard-split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let pieces = chunk_by_chars(word, max_chars);
        for piece in pieces {
            let len = piece.chars().count();
            if current_len > 0 && current_len + 1 + len > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_fixed_windows() {
        let body = "a".repeat(2500);
        let doc = PagedDocument::new("doc_1", "T", &body, 1000);
        let sizes: Vec<usize> = doc.chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(doc.chunks.concat(), body);
    }

    #[test]
    fn empty_body_has_no_chunks() {
        let doc = PagedDocument::new("doc_1", "T", "", 1000);
        assert!(doc.chunks.is_empty());
    }

    #[test]
    fn identifier_line_format() {
        let doc = PagedDocument::new("doc_7", "T", "x", 10);
        assert_eq!(doc.identifier_line(), "ID: doc_7");
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four five six", 9);
        assert_eq!(lines, vec!["one two", "three", "four five", "six"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 9));
    }

    #[test]
    fn wrap_splits_long_words() {
        let lines = wrap_text(&"x".repeat(25), 10);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "xxxxx");
    }

    #[test]
    fn wrap_blank_line_gives_one_empty_line() {
        assert_eq!(wrap_text("   ", 10), vec![String::new()]);
    }

    #[test]
    fn pdf_renderer_produces_pdf_bytes() {
        let body = "Lorem ipsum dolor sit amet. ".repeat(400);
        let doc = PagedDocument::new("doc_1", "A Title", &body, 1000);
        let bytes = PdfRenderer::default().render(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

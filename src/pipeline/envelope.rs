//! Markdown envelope: front-matter block followed by the body.
//!
//! ```text
//! ---
//! key: value
//! ---
//!
//! body
//! ```
//!
//! Values are written raw. Line breaks inside a value are folded into a
//! single space so every entry occupies exactly one line.

use crate::output::NormalizedDocument;

pub const FRONT_MATTER_DELIMITER: &str = "---";

/// Render a document as front matter plus body.
pub fn render_markdown(doc: &NormalizedDocument) -> String {
    let mut out = String::with_capacity(doc.body.len() + 64 * (doc.metadata.len() + 1));
    out.push_str(FRONT_MATTER_DELIMITER);
    out.push('\n');
    for (key, value) in doc.metadata.iter() {
        out.push_str(&single_line(key));
        out.push_str(": ");
        out.push_str(&single_line(&value.to_string()));
        out.push('\n');
    }
    out.push_str(FRONT_MATTER_DELIMITER);
    out.push_str("\n\n");
    out.push_str(&doc.body);
    out
}

fn single_line(s: &str) -> String {
    if s.contains(['\n', '\r']) {
        s.split(['\n', '\r'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Metadata;

    fn doc(metadata: Metadata, body: &str) -> NormalizedDocument {
        NormalizedDocument {
            identifier: "x".into(),
            metadata,
            body: body.into(),
        }
    }

    #[test]
    fn renders_front_matter_then_body() {
        let mut m = Metadata::new();
        m.insert("doc_id", 1i64);
        m.insert("title", "Hello");
        let md = render_markdown(&doc(m, "Body text"));
        assert_eq!(md, "---\ndoc_id: 1\ntitle: Hello\n---\n\nBody text");
    }

    #[test]
    fn empty_metadata_still_delimited() {
        let md = render_markdown(&doc(Metadata::new(), "just body"));
        assert_eq!(md, "---\n---\n\njust body");
    }

    #[test]
    fn multi_line_values_fold_to_one_line() {
        let mut m = Metadata::new();
        m.insert("title", "Line one\n  line two\r\n");
        let md = render_markdown(&doc(m, ""));
        assert!(md.contains("title: Line one line two\n"), "got: {md:?}");
    }

    #[test]
    fn body_keeps_unicode() {
        let md = render_markdown(&doc(Metadata::new(), "日本語 ∑ é"));
        assert!(md.ends_with("日本語 ∑ é"));
    }
}

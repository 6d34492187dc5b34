//! Filename-safe identifiers derived from arbitrary record text.

/// Convert `raw` into a bounded filename fragment.
///
/// Every character outside `[A-Za-z0-9 _-]` becomes `_`; the result is
/// trimmed, internal whitespace runs collapse to a single `_`, and the
/// output is cut to `max_len` characters. An empty input yields an empty
/// string, so callers must supply an ordinal-based fallback.
pub fn sanitize_identifier(raw: &str, max_len: usize) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
    }

    #[test]
    fn replaces_punctuation() {
        assert_eq!(sanitize_identifier("A/B: C?", 100), "A_B__C_");
    }

    #[test]
    fn collapses_spaces() {
        assert_eq!(
            sanitize_identifier("  Attention   Is All  ", 100),
            "Attention_Is_All"
        );
    }

    #[test]
    fn non_ascii_letters_are_replaced() {
        assert_eq!(sanitize_identifier("Café Münster", 100), "Caf__M_nster");
    }

    #[test]
    fn truncates_to_max_len() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_identifier(&long, 100).len(), 100);
        assert_eq!(sanitize_identifier("abcdef", 3), "abc");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(sanitize_identifier("", 100), "");
        assert_eq!(sanitize_identifier("   ", 100), "");
    }

    #[test]
    fn output_is_always_safe_and_bounded() {
        let inputs = [
            "",
            "plain",
            "tab\tand\nnewline",
            "emoji 🚀 rocket",
            "../../etc/passwd",
            "名前のテスト",
            "\u{0}\u{7f}\u{200b}",
            "a-b_c d",
        ];
        for input in inputs {
            for max_len in [1, 5, 100] {
                let out = sanitize_identifier(input, max_len);
                assert!(is_safe(&out), "unsafe output {out:?} for {input:?}");
                assert!(out.chars().count() <= max_len);
            }
        }
    }

    #[test]
    fn path_separators_never_survive() {
        let out = sanitize_identifier("../../etc/passwd", 100);
        assert!(!out.contains('/'));
        assert!(!out.contains('.'));
    }
}

//! Character sanitizer for output encodings with a restricted range.
//!
//! The replacement is strictly one character for one character. Paged
//! output is chunked by character count after sanitizing, so the chunk
//! windows must line up with the pre-sanitized text.

/// Replace characters the target encoding cannot represent.
///
/// * code point `>= max_code_point` → `' '`
/// * control characters (`< 32`) → `' '`, except `\n`, `\r`, `\t` when
///   `allow_newlines` is true
///
/// The output has exactly as many characters as the input.
pub fn sanitize_for_output(text: &str, max_code_point: u32, allow_newlines: bool) -> String {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if cp >= max_code_point {
                ' '
            } else if cp < 32 {
                if allow_newlines && matches!(c, '\n' | '\r' | '\t') {
                    c
                } else {
                    ' '
                }
            } else {
                c
            }
        })
        .collect()
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Simple word tokenizer used for corpus statistics.
//!
//! Non-word, non-whitespace characters become spaces, the text is
//! lower-cased, and the result is split on whitespace runs. No stemming and
//! no locale rules: counts must be reproducible across implementations.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Split `text` into lower-case word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    RE_NON_WORD
        .replace_all(text, " ")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Number of tokens [`tokenize`] would produce.
pub fn count_tokens(text: &str) -> usize {
    tokenize(text).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_123() {
        assert_eq!(count_tokens("Hello, World! 123"), 3);
        assert_eq!(tokenize("Hello, World! 123"), vec!["hello", "world", "123"]);
    }

    #[test]
    fn empty_and_punctuation_only() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("   \n\t"), 0);
        assert_eq!(count_tokens("!!! ??? ..."), 0);
    }

    #[test]
    fn punctuation_splits_words() {
        assert_eq!(tokenize("state-of-the-art"), vec!["state", "of", "the", "art"]);
        assert_eq!(tokenize("don't"), vec!["don", "t"]);
    }

    #[test]
    fn underscores_are_word_characters() {
        assert_eq!(tokenize("snake_case id"), vec!["snake_case", "id"]);
    }

    #[test]
    fn unicode_words_are_kept() {
        assert_eq!(tokenize("Café Über"), vec!["café", "über"]);
    }

    #[test]
    fn count_matches_tokenize() {
        let text = "The quick, brown fox — jumps over 2 lazy dogs.";
        assert_eq!(count_tokens(text), tokenize(text).len());
    }

    #[test]
    fn count_matches_lowercased_tokens() {
        let text = "Straße ÉCOLE, Ünïcode! MIXED case";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec!["straße", "école", "ünïcode", "mixed", "case"]);
        assert_eq!(count_tokens(text), tokens.len());
    }
}

//! Text normalization into comparable token sets.
//!
//! A document's token set is the derived, ephemeral view the similarity
//! scorer works on: lowercased words with punctuation stripped and short
//! tokens discarded. It is never persisted — it is recomputed from the
//! stored body whenever a comparison runs.

use std::collections::HashSet;

/// Tokens this short carry no matching signal and are discarded.
const MIN_TOKEN_LEN: usize = 3;

/// Normalize raw text into a set of comparable word tokens.
///
/// Lowercases the input, strips every character that is neither
/// alphanumeric nor whitespace, splits on whitespace runs, and discards
/// tokens shorter than three characters. Deterministic and total: the
/// empty string yields the empty set.
pub fn tokenize(text: &str) -> HashSet<String> {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else if ch.is_whitespace() {
            cleaned.push(' ');
        }
    }

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_lowercases_strips_punctuation_collapses_duplicates() {
        // "the" (length 3) is kept, punctuation is stripped, the
        // duplicate "quick" collapses into one token.
        let tokens = tokenize("The Quick, Quick Fox!!");
        assert_eq!(tokens, set(&["the", "quick", "fox"]));
    }

    #[test]
    fn test_empty_string() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_punctuation_only() {
        assert!(tokenize("?! ... --- ,,,").is_empty());
    }

    #[test]
    fn test_short_tokens_discarded() {
        let tokens = tokenize("a an to the word");
        assert_eq!(tokens, set(&["the", "word"]));
    }

    #[test]
    fn test_punctuation_does_not_join_words() {
        // Stripping "-" must not fuse "well-known" into one token of
        // different length; it splits nothing but drops the dash.
        let tokens = tokenize("well-known facts");
        assert_eq!(tokens, set(&["wellknown", "facts"]));
    }

    #[test]
    fn test_digits_kept() {
        let tokens = tokenize("route 66 covers 3940 kilometers");
        assert_eq!(tokens, set(&["route", "covers", "3940", "kilometers"]));
    }

    #[test]
    fn test_whitespace_runs() {
        let tokens = tokenize("  alpha \t\n  beta   ");
        assert_eq!(tokens, set(&["alpha", "beta"]));
    }

    #[test]
    fn test_deterministic() {
        let a = tokenize("Some, sample. Text!");
        let b = tokenize("Some, sample. Text!");
        assert_eq!(a, b);
    }
}

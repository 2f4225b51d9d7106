//! Pairwise text similarity primitives.
//!
//! [`jaccard`] is the scorer the match ranker runs on token sets;
//! [`levenshtein`] is a general string-distance utility kept available
//! for callers that need character-level edit distance. Neither touches
//! the store.

use std::collections::HashSet;

/// Jaccard similarity `|a ∩ b| / |a ∪ b|` in [0, 1].
///
/// Symmetric in its arguments. When both sets are empty the union is
/// empty too; that case is defined as 0.0 rather than dividing by zero.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    intersection as f64 / union as f64
}

/// Levenshtein edit distance between two strings.
///
/// Unit cost per insert, delete, and substitute, computed over Unicode
/// scalar values with the classic O(m·n) dynamic-programming recurrence
/// (two rolling rows). `levenshtein(a, a) == 0`; the distance is
/// symmetric and satisfies the triangle inequality.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, &ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_jaccard_identical_nonempty_is_one() {
        let a = set(&["alpha", "beta", "gamma"]);
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn test_jaccard_both_empty_is_zero() {
        let empty = HashSet::new();
        assert_eq!(jaccard(&empty, &empty), 0.0);
    }

    #[test]
    fn test_jaccard_one_empty_is_zero() {
        let a = set(&["alpha"]);
        let empty = HashSet::new();
        assert_eq!(jaccard(&a, &empty), 0.0);
        assert_eq!(jaccard(&empty, &a), 0.0);
    }

    #[test]
    fn test_jaccard_disjoint_is_zero() {
        let a = set(&["alpha", "beta"]);
        let b = set(&["gamma", "delta"]);
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        // Intersection {alpha, beta} = 2, union = 4.
        let a = set(&["alpha", "beta", "gamma"]);
        let b = set(&["alpha", "beta", "delta"]);
        assert_eq!(jaccard(&a, &b), 0.5);
    }

    #[test]
    fn test_jaccard_symmetric() {
        let pairs = [
            (set(&["one", "two", "three"]), set(&["two", "three", "four"])),
            (set(&["solo"]), set(&[])),
            (set(&["x1", "x2"]), set(&["x1", "x2", "x3", "x4", "x5"])),
        ];
        for (a, b) in &pairs {
            assert_eq!(jaccard(a, b), jaccard(b, a));
        }
    }

    #[test]
    fn test_levenshtein_identical_is_zero() {
        assert_eq!(levenshtein("kitten", "kitten"), 0);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn test_levenshtein_classic_cases() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abcd"), 4);
    }

    #[test]
    fn test_levenshtein_symmetric() {
        assert_eq!(
            levenshtein("saturday", "sunday"),
            levenshtein("sunday", "saturday")
        );
    }

    #[test]
    fn test_levenshtein_triangle_inequality() {
        let words = ["kitten", "sitting", "mitten", "fitting"];
        for a in &words {
            for b in &words {
                for c in &words {
                    assert!(levenshtein(a, c) <= levenshtein(a, b) + levenshtein(b, c));
                }
            }
        }
    }

    #[test]
    fn test_levenshtein_unicode() {
        // Distance counts scalar values, not bytes.
        assert_eq!(levenshtein("über", "uber"), 1);
    }
}

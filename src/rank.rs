//! Corpus-wide match ranking.
//!
//! Scores a target document against every other corpus member with
//! [`jaccard`] over tokenized bodies, keeps results at or above the
//! threshold, and orders them by descending similarity. Thresholding and
//! ordering use the unrounded score; only the reported value is rounded,
//! so rounding can never invert ranks or flip a threshold decision.

use crate::models::{Document, RankedMatch};
use crate::similarity::jaccard;
use crate::tokenize::tokenize;

/// Default minimum similarity for a corpus document to count as a match.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Rank `corpus` against `target`, excluding the target itself.
///
/// The scan is sequential over the corpus in its given order and the
/// sort is stable, so equal-similarity documents keep their scan order —
/// results are deterministic for a fixed corpus ordering.
pub fn rank_matches(target: &Document, corpus: &[Document], threshold: f64) -> Vec<RankedMatch> {
    let target_tokens = tokenize(&target.body);

    let mut scored: Vec<(&Document, f64)> = corpus
        .iter()
        .filter(|doc| doc.id != target.id)
        .map(|doc| {
            let similarity = jaccard(&target_tokens, &tokenize(&doc.body));
            (doc, similarity)
        })
        .filter(|(_, similarity)| *similarity >= threshold)
        .collect();

    // Vec::sort_by is stable; ties keep corpus scan order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .map(|(doc, similarity)| RankedMatch {
            document_id: doc.id.clone(),
            title: doc.title.clone(),
            owner_id: doc.owner_id.clone(),
            similarity: round2(similarity),
        })
        .collect()
}

/// Round to 2 decimal places for reporting and persistence.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

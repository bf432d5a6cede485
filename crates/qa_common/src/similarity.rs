//! Similarity Scorer
//!
//! Normalized edit-distance similarity between canonical keyword strings:
//! `1 - levenshtein(a, b) / max(len(a), len(b))`, lengths in chars.

use crate::tokenizer::{canonicalize, CanonicalKeywords};

/// Similarity of two strings in [0.0, 1.0]. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

pub fn keyword_similarity(a: &CanonicalKeywords, b: &CanonicalKeywords) -> f64 {
    similarity(a.as_str(), b.as_str())
}

/// Canonicalize two raw texts, then score them
pub fn compare(text_a: &str, text_b: &str) -> f64 {
    keyword_similarity(&canonicalize(text_a), &canonicalize(text_b))
}

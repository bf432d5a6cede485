//! Tokenizer v0.4.0
//!
//! Splits free text into word tokens and builds the canonical keyword form:
//! tokens sorted by code point and joined with a single space.
//!
//! Segmentation is dictionary based (jieba) so dense CJK text and
//! space-delimited Latin text share one code path.

use jieba_rs::Jieba;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Separator between canonical tokens. Whitespace never survives tokenization.
pub const SEPARATOR: char = ' ';

fn jieba() -> &'static Jieba {
    static INSTANCE: OnceLock<Jieba> = OnceLock::new();
    INSTANCE.get_or_init(Jieba::new)
}

/// Split text into tokens in reading order
pub fn tokenize(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    jieba()
        .cut(text, true)
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Build the canonical keyword string for a text
pub fn canonicalize(text: &str) -> CanonicalKeywords {
    CanonicalKeywords::from_tokens(tokenize(text))
}

/// Sorted, space-joined token multiset of a text
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKeywords(String);

impl CanonicalKeywords {
    pub fn from_tokens(mut tokens: Vec<String>) -> Self {
        // UTF-8 byte order is code point order
        tokens.sort();
        let mut joined = String::new();
        for token in &tokens {
            if !joined.is_empty() {
                joined.push(SEPARATOR);
            }
            joined.push_str(token);
        }
        Self(joined)
    }

    /// Rebuild from a string previously produced by `canonicalize`
    pub fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|t| !t.is_empty())
    }

    /// Distinct tokens, in canonical order
    pub fn token_set(&self) -> BTreeSet<&str> {
        self.tokens().collect()
    }
}

impl fmt::Display for CanonicalKeywords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n ").is_empty());
        assert!(canonicalize("").is_empty());
        assert!(canonicalize("  ").is_empty());
    }

    #[test]
    fn test_no_whitespace_tokens() {
        let tokens = tokenize("how  do I\treset my password");
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
        assert!(tokens.iter().all(|t| !t.contains(SEPARATOR)));
    }

    #[test]
    fn test_order_insensitive() {
        assert_eq!(canonicalize("hello world"), canonicalize("world hello"));
        assert_eq!(canonicalize("注册 账号"), canonicalize("账号 注册"));
    }

    #[test]
    fn test_canonical_is_sorted() {
        let keywords = canonicalize("zeta alpha mu");
        assert_eq!(keywords.as_str(), "alpha mu zeta");

        let tokens: Vec<&str> = keywords.tokens().collect();
        let mut sorted = tokens.clone();
        sorted.sort();
        assert_eq!(tokens, sorted);
    }

    #[test]
    fn test_duplicates_kept_in_canonical_form() {
        let keywords = CanonicalKeywords::from_tokens(vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
        ]);
        assert_eq!(keywords.as_str(), "a b b");
        assert_eq!(keywords.token_set().len(), 2);
    }

    #[test]
    fn test_cjk_is_segmented() {
        let tokens = tokenize("如何注册账号");
        assert!(tokens.len() > 1, "expected segmentation, got {:?}", tokens);
        assert_eq!(tokens.concat(), "如何注册账号");
    }

    #[test]
    fn test_round_trip_from_stored() {
        let keywords = canonicalize("reset password");
        let stored = keywords.as_str().to_string();
        assert_eq!(CanonicalKeywords::from_stored(stored), keywords);
    }
}

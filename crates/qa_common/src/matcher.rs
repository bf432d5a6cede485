//! Matcher v0.4.0
//!
//! Finds the stored question best matching a free-text query.
//!
//! Phases, first success wins:
//! 1. Exact: query equals a stored question verbatim
//! 2. Global: best keyword similarity across all entries, must exceed threshold
//! 3. Containment: share of an entry's keywords present in the query
//!
//! When nothing matches, `suggest` can list questions sharing a keyword with
//! the query, rate limited per keyword by a `TriggerLimiter`.

use crate::knowledge::Entry;
use crate::similarity::keyword_similarity;
use crate::tokenizer::{canonicalize, CanonicalKeywords};
use crate::trigger::TriggerLimiter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Which phase produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Exact,
    Global,
    Containment,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Exact => "exact",
            Provenance::Global => "global",
            Provenance::Containment => "containment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub question: String,
    pub answer: String,
    pub provenance: Provenance,
    /// 1.0 for exact, similarity for global, ratio for containment
    pub score: f64,
}

impl MatchResult {
    fn from_entry(entry: &Entry, provenance: Provenance, score: f64) -> Self {
        Self {
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            provenance,
            score,
        }
    }
}

/// Questions offered for a keyword found in an unmatched query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub keyword: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    /// Global similarity must be strictly greater
    pub global: f64,
    /// Containment ratio must be greater or equal
    pub containment: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            global: 0.75,
            containment: 0.67,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestPolicy {
    /// Entries that must share the keyword
    pub min_questions: usize,
    /// Questions listed at most
    pub max_questions: usize,
}

impl Default for SuggestPolicy {
    fn default() -> Self {
        Self {
            min_questions: 2,
            max_questions: 5,
        }
    }
}

/// Share of `entry` tokens found in `query`, over distinct tokens.
/// None when the entry has no tokens.
pub fn containment_ratio(entry: &CanonicalKeywords, query: &BTreeSet<&str>) -> Option<f64> {
    let entry_tokens = entry.token_set();
    if entry_tokens.is_empty() {
        return None;
    }

    let shared = entry_tokens.iter().filter(|t| query.contains(*t)).count();
    Some(shared as f64 / entry_tokens.len() as f64)
}

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    thresholds: MatchThresholds,
}

impl Matcher {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Match a query against entries in storage order
    pub fn find(&self, query: &str, entries: &[Entry]) -> Option<MatchResult> {
        if let Some(entry) = entries.iter().find(|e| e.question == query) {
            debug!("Exact match for {:?}", query);
            return Some(MatchResult::from_entry(entry, Provenance::Exact, 1.0));
        }

        self.find_fuzzy(&canonicalize(query), entries)
    }

    /// Global then containment phase over an already canonical query
    pub fn find_fuzzy(&self, query: &CanonicalKeywords, entries: &[Entry]) -> Option<MatchResult> {
        self.global_phase(query, entries)
            .or_else(|| self.containment_phase(query, entries))
    }

    fn global_phase(&self, query: &CanonicalKeywords, entries: &[Entry]) -> Option<MatchResult> {
        let mut best: Option<(&Entry, f64)> = None;
        for entry in entries {
            let score = keyword_similarity(query, &entry.keywords);
            // Strictly greater keeps the first entry on ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        let (entry, score) = best?;
        debug!(
            "Global best {:?} = {:.3} (threshold {:.3})",
            entry.question, score, self.thresholds.global
        );

        (score > self.thresholds.global)
            .then(|| MatchResult::from_entry(entry, Provenance::Global, score))
    }

    fn containment_phase(
        &self,
        query: &CanonicalKeywords,
        entries: &[Entry],
    ) -> Option<MatchResult> {
        let query_tokens = query.token_set();

        entries.iter().find_map(|entry| {
            let ratio = containment_ratio(&entry.keywords, &query_tokens)?;
            if ratio >= self.thresholds.containment {
                debug!("Containment match {:?} = {:.3}", entry.question, ratio);
                Some(MatchResult::from_entry(entry, Provenance::Containment, ratio))
            } else {
                None
            }
        })
    }

    /// Offer questions sharing a keyword with an unmatched query.
    ///
    /// The first query token (canonical order) shared by at least
    /// `min_questions` entries is the trigger keyword; tokens without
    /// letters or digits never trigger. Returns None when the keyword is
    /// still cooling down.
    pub fn suggest(
        &self,
        query: &str,
        entries: &[Entry],
        limiter: &TriggerLimiter,
        now: DateTime<Utc>,
        policy: &SuggestPolicy,
    ) -> Option<Suggestion> {
        let query = canonicalize(query);
        let entry_tokens: Vec<BTreeSet<&str>> =
            entries.iter().map(|e| e.keywords.token_set()).collect();

        for token in query.token_set() {
            if !token.chars().any(char::is_alphanumeric) {
                continue;
            }

            let candidates: Vec<&Entry> = entries
                .iter()
                .zip(&entry_tokens)
                .filter(|(_, tokens)| tokens.contains(token))
                .map(|(entry, _)| entry)
                .collect();

            if candidates.len() < policy.min_questions {
                continue;
            }

            if !limiter.allow(token, now) {
                debug!("Suggestion for {:?} suppressed by cooldown", token);
                return None;
            }

            return Some(Suggestion {
                keyword: token.to_string(),
                questions: candidates
                    .into_iter()
                    .take(policy.max_questions)
                    .map(|e| e.question.clone())
                    .collect(),
            });
        }

        None
    }
}

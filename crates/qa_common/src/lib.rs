//! QA Common - Matching and storage engine for the group FAQ bot
//!
//! Free-text questions are canonicalized into sorted keyword strings and
//! matched against a per-group knowledge base in three phases:
//! exact question, global edit-distance similarity, keyword containment.

pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod matcher;
pub mod similarity;
pub mod switch;
pub mod tokenizer;
pub mod trigger;

pub use config::QaConfig;
pub use engine::{Answer, QaEngine};
pub use error::{QaError, Result};
pub use knowledge::{Entry, KnowledgeBase, KnowledgeStore, UpsertOutcome};
pub use matcher::{MatchResult, MatchThresholds, Matcher, Provenance, Suggestion};
pub use switch::{MemorySwitchGate, SwitchGate};
pub use tokenizer::CanonicalKeywords;
pub use trigger::TriggerLimiter;

//! QA Engine
//!
//! Entry point used by chat adapters. Checks the switch gate, reads the
//! namespace snapshot on the blocking pool under a deadline, then runs the
//! matcher. CRUD calls go straight to the namespace store.

use crate::config::{QaConfig, TriggerScope};
use crate::error::{QaError, Result};
use crate::knowledge::{import_legacy_json, Entry, ImportReport, KnowledgeBase, UpsertOutcome};
use crate::matcher::{MatchResult, Matcher, Suggestion};
use crate::similarity;
use crate::switch::SwitchGate;
use crate::trigger::TriggerLimiter;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of asking the engine a question
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Switch is off for this namespace
    Disabled,
    Matched(MatchResult),
    Suggested(Suggestion),
    NoMatch,
}

impl Answer {
    pub fn is_match(&self) -> bool {
        matches!(self, Answer::Matched(_))
    }
}

pub struct QaEngine {
    config: QaConfig,
    knowledge: Arc<KnowledgeBase>,
    switch: Arc<dyn SwitchGate>,
    limiters: RwLock<HashMap<String, Arc<TriggerLimiter>>>,
    global_limiter: Arc<TriggerLimiter>,
}

impl QaEngine {
    pub fn new(config: QaConfig, switch: Arc<dyn SwitchGate>) -> Self {
        let knowledge = Arc::new(KnowledgeBase::from_config(&config.storage));
        let global_limiter = Arc::new(TriggerLimiter::new(config.trigger.cooldown()));
        info!(
            "QA engine ready (data dir {}, trigger scope {})",
            knowledge.data_dir().display(),
            config.trigger.scope.as_str()
        );

        Self {
            config,
            knowledge,
            switch,
            limiters: RwLock::new(HashMap::new()),
            global_limiter,
        }
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    /// Trigger limiter for a namespace, created on first use
    pub fn limiter(&self, namespace: &str) -> Arc<TriggerLimiter> {
        if self.config.trigger.scope == TriggerScope::Global {
            return Arc::clone(&self.global_limiter);
        }

        let limiters = self
            .limiters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(limiter) = limiters.get(namespace) {
            return Arc::clone(limiter);
        }
        drop(limiters);

        let mut limiters = self
            .limiters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let limiter = limiters
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(TriggerLimiter::new(self.config.trigger.cooldown())));
        Arc::clone(limiter)
    }

    pub fn is_enabled(&self, namespace: &str) -> bool {
        self.switch.is_enabled(namespace)
    }

    pub fn set_enabled(&self, namespace: &str, enabled: bool) -> Result<()> {
        crate::knowledge::validate_namespace(namespace)?;
        self.switch.set_enabled(namespace, enabled)?;
        info!("Namespace {} switched {}", namespace, if enabled { "on" } else { "off" });
        Ok(())
    }

    fn ensure_enabled(&self, namespace: &str) -> Result<()> {
        if self.switch.is_enabled(namespace) {
            Ok(())
        } else {
            Err(QaError::Disabled(namespace.to_string()))
        }
    }

    /// Run store work on the blocking pool, optionally bounded by a deadline
    async fn run_blocking<F, R>(&self, deadline: Option<Duration>, f: F) -> Result<R>
    where
        F: FnOnce(&KnowledgeBase) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let knowledge = Arc::clone(&self.knowledge);
        let task = tokio::task::spawn_blocking(move || f(&knowledge));

        let joined = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, task)
                .await
                .map_err(|_| QaError::Timeout(deadline))?,
            None => task.await,
        };

        joined.map_err(|e| QaError::Internal(format!("storage task failed: {}", e)))?
    }

    /// Answer a query using the configured match deadline
    pub async fn ask(&self, namespace: &str, query: &str) -> Result<Answer> {
        self.ask_with_deadline(namespace, query, self.config.engine.match_timeout())
            .await
    }

    /// Answer a query; storage access must finish within `deadline`
    pub async fn ask_with_deadline(
        &self,
        namespace: &str,
        query: &str,
        deadline: Duration,
    ) -> Result<Answer> {
        crate::knowledge::validate_namespace(namespace)?;
        if !self.switch.is_enabled(namespace) {
            debug!("Namespace {} is switched off", namespace);
            return Ok(Answer::Disabled);
        }

        let ns = namespace.to_string();
        let entries: Vec<Entry> = self
            .run_blocking(Some(deadline), move |kb| kb.store(&ns)?.all_for_match())
            .await?;

        Ok(self.answer_from(namespace, query, &entries, Utc::now()))
    }

    fn answer_from(
        &self,
        namespace: &str,
        query: &str,
        entries: &[Entry],
        now: DateTime<Utc>,
    ) -> Answer {
        let matcher = Matcher::new(self.config.matching.thresholds_for(namespace));

        if let Some(result) = matcher.find(query, entries) {
            debug!(
                "{}: {:?} matched {:?} via {} ({:.3})",
                namespace,
                query,
                result.question,
                result.provenance.as_str(),
                result.score
            );
            return Answer::Matched(result);
        }

        if self.config.suggest.enabled {
            let limiter = self.limiter(namespace);
            limiter.cleanup(now);
            let policy = self.config.suggest.policy();
            if let Some(suggestion) = matcher.suggest(query, entries, &limiter, now, &policy) {
                return Answer::Suggested(suggestion);
            }
        }

        Answer::NoMatch
    }

    /// Insert or replace a question
    pub async fn upsert(
        &self,
        namespace: &str,
        question: &str,
        answer: &str,
    ) -> Result<UpsertOutcome> {
        crate::knowledge::validate_namespace(namespace)?;
        self.ensure_enabled(namespace)?;

        let ns = namespace.to_string();
        let (question, answer) = (question.to_string(), answer.to_string());
        self.run_blocking(None, move |kb| kb.store(&ns)?.upsert(&question, &answer))
            .await
    }

    /// Delete a question; false when it was not stored
    pub async fn delete(&self, namespace: &str, question: &str) -> Result<bool> {
        crate::knowledge::validate_namespace(namespace)?;
        self.ensure_enabled(namespace)?;

        let (ns, question) = (namespace.to_string(), question.to_string());
        self.run_blocking(None, move |kb| kb.store(&ns)?.delete(&question))
            .await
    }

    /// (question, answer) pairs in storage order
    pub async fn list(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        crate::knowledge::validate_namespace(namespace)?;
        self.ensure_enabled(namespace)?;

        let ns = namespace.to_string();
        self.run_blocking(None, move |kb| kb.store(&ns)?.list()).await
    }

    /// Import a legacy keyword-grouped JSON file
    pub async fn import_legacy(&self, namespace: &str, path: PathBuf) -> Result<ImportReport> {
        crate::knowledge::validate_namespace(namespace)?;
        self.ensure_enabled(namespace)?;

        let ns = namespace.to_string();
        self.run_blocking(None, move |kb| {
            let store = kb.store(&ns)?;
            import_legacy_json(&store, &path)
        })
        .await
    }

    /// Similarity of two texts after canonicalization
    pub fn compare(&self, text_a: &str, text_b: &str) -> f64 {
        similarity::compare(text_a, text_b)
    }
}

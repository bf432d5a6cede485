//! Legacy Import - Load keyword-grouped JSON knowledge files
//!
//! The first bot generation kept one JSON file per group:
//!
//! ```json
//! [{"keyword": "注册", "question": {"如何注册账号": "点击右上角注册"}}]
//! ```
//!
//! Every question/answer pair is upserted into the namespace store. The
//! authored keyword is dropped; keywords are re-derived from the question.

use super::store::KnowledgeStore;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Import result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Pairs written to the store
    pub imported: usize,
    /// Groups or pairs missing required fields
    pub skipped: usize,
}

/// Import a legacy JSON file into `store`
pub fn import_legacy_json(store: &KnowledgeStore, path: &Path) -> Result<ImportReport> {
    let content = std::fs::read_to_string(path)?;
    let report = import_legacy_str(store, &content)?;
    info!(
        "Imported {} legacy entries into {} from {} ({} skipped)",
        report.imported,
        store.namespace(),
        path.display(),
        report.skipped
    );
    Ok(report)
}

/// Import legacy JSON content into `store`
pub fn import_legacy_str(store: &KnowledgeStore, content: &str) -> Result<ImportReport> {
    let groups: Vec<Value> = serde_json::from_str(content)?;
    let mut report = ImportReport::default();

    for group in &groups {
        let Some(questions) = group.get("question").and_then(Value::as_object) else {
            warn!("Skipping legacy group without question map: {}", group);
            report.skipped += 1;
            continue;
        };

        for (question, answer) in questions {
            match answer.as_str() {
                Some(answer) if !question.trim().is_empty() => {
                    store.upsert(question, answer)?;
                    report.imported += 1;
                }
                _ => {
                    warn!("Skipping malformed legacy pair for {:?}", question);
                    report.skipped += 1;
                }
            }
        }
    }

    Ok(report)
}

//! Knowledge Store Implementation
//!
//! SQLite-backed storage for one namespace.
//! Location: <data_dir>/<namespace>.db

use super::schema::{validate_namespace, Entry, UpsertOutcome, SCHEMA_VERSION};
use crate::error::{QaError, Result};
use crate::tokenizer::{canonicalize, CanonicalKeywords};
use chrono::Utc;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

const UPSERT_SQL: &str = r#"
    INSERT INTO entries (question, answer, keywords, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?4)
    ON CONFLICT(question) DO UPDATE SET
        answer = excluded.answer,
        keywords = excluded.keywords,
        updated_at = excluded.updated_at
"#;

/// Row as read from disk; any column may be missing in foreign files
struct RawRow {
    question: Option<String>,
    answer: Option<String>,
    keywords: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            question: text_column(row, 0)?,
            answer: text_column(row, 1)?,
            keywords: text_column(row, 2)?,
        })
    }

    fn into_entry(self) -> Option<Entry> {
        Some(Entry {
            question: self.question?,
            answer: self.answer?,
            keywords: CanonicalKeywords::from_stored(self.keywords?),
        })
    }
}

fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().map(String::from),
        _ => None,
    })
}

/// Knowledge store for a single namespace
pub struct KnowledgeStore {
    namespace: String,
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl KnowledgeStore {
    /// Open or create the store for `namespace` at a specific path
    pub fn open(namespace: &str, path: &Path, busy_timeout: Duration) -> Result<Self> {
        validate_namespace(namespace)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;

        // WAL lets readers in other processes see a consistent snapshot
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!("Namespace {} journal mode: {}", namespace, mode);

        let store = Self {
            namespace: namespace.to_string(),
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        };

        store.init_schema()?;
        info!("Opened knowledge store for {} at {}", namespace, path.display());
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            QaError::Internal(format!("knowledge store lock poisoned: {}", self.namespace))
        })
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL UNIQUE,
                answer TEXT NOT NULL,
                keywords TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let version = SCHEMA_VERSION.to_string();
        if stored.as_deref() != Some(version.as_str()) {
            conn.execute(
                "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?1)",
                params![version],
            )?;
            debug!("{}: schema version set to {}", self.namespace, version);
        }

        Ok(())
    }

    /// Insert a question or replace its answer. Keywords are recomputed.
    pub fn upsert(&self, question: &str, answer: &str) -> Result<UpsertOutcome> {
        if question.trim().is_empty() {
            return Err(QaError::InvalidInput("question must not be empty".to_string()));
        }

        let keywords = canonicalize(question);
        let now = Utc::now();

        let mut conn = self.lock()?;
        // Take the write lock up front; a read-then-write upgrade can fail
        // with SQLITE_BUSY without waiting on the busy timeout
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existed = tx
            .query_row(
                "SELECT 1 FROM entries WHERE question = ?1",
                params![question],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        tx.execute(UPSERT_SQL, params![question, answer, keywords.as_str(), now])?;
        tx.commit()?;

        let outcome = if existed {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        };
        info!("{}: {} {:?}", self.namespace, outcome.as_str(), question);
        Ok(outcome)
    }

    /// Remove a question. Returns whether a row was removed.
    pub fn delete(&self, question: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count = conn.execute("DELETE FROM entries WHERE question = ?1", params![question])?;

        if count > 0 {
            info!("{}: deleted {:?}", self.namespace, question);
        }
        Ok(count > 0)
    }

    /// Get a single entry by question
    pub fn get(&self, question: &str) -> Result<Option<Entry>> {
        let conn = self.lock()?;

        let raw = conn
            .query_row(
                "SELECT question, answer, keywords FROM entries WHERE question = ?1",
                params![question],
                RawRow::read,
            )
            .optional()?;

        Ok(raw.and_then(RawRow::into_entry))
    }

    /// (question, answer) pairs in storage order
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .all_for_match()?
            .into_iter()
            .map(|e| (e.question, e.answer))
            .collect())
    }

    /// Point-in-time snapshot of every well-formed entry, in storage order
    pub fn all_for_match(&self) -> Result<Vec<Entry>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT question, answer, keywords FROM entries ORDER BY id")?;
        let rows = stmt.query_map([], RawRow::read)?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            match row?.into_entry() {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("{}: skipped {} malformed rows", self.namespace, skipped);
        }
        Ok(entries)
    }

    /// Total row count, malformed rows included
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Run a closure against the connection while holding the namespace lock
    #[cfg(test)]
    pub(crate) fn with_connection<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get database path
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

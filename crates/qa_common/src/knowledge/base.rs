//! Namespace registry
//!
//! Opens one `KnowledgeStore` per namespace on first access and keeps it for
//! the life of the process. The map lock only guards slot lookup; a store is
//! opened under its own slot lock, so each namespace is opened exactly once.

use super::schema::validate_namespace;
use super::store::KnowledgeStore;
use crate::config::StorageConfig;
use crate::error::{QaError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::debug;

/// Per-namespace slot, filled once by whichever caller gets there first
type StoreSlot = Arc<Mutex<Option<Arc<KnowledgeStore>>>>;

pub struct KnowledgeBase {
    data_dir: PathBuf,
    busy_timeout: Duration,
    stores: RwLock<HashMap<String, StoreSlot>>,
}

impl KnowledgeBase {
    pub fn new(data_dir: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            data_dir: data_dir.into(),
            busy_timeout,
            stores: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.data_dir.clone(), config.busy_timeout())
    }

    /// Store for `namespace`, opened lazily
    pub fn store(&self, namespace: &str) -> Result<Arc<KnowledgeStore>> {
        validate_namespace(namespace)?;

        let slot = self.slot(namespace)?;
        // Only one opener per namespace; other namespaces are not held up
        let mut slot = slot.lock().map_err(|_| {
            QaError::Internal(format!("namespace slot lock poisoned: {}", namespace))
        })?;
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(KnowledgeStore::open(
            namespace,
            &self.store_path(namespace),
            self.busy_timeout,
        )?);
        *slot = Some(Arc::clone(&store));
        debug!("Registered namespace {}", namespace);
        Ok(store)
    }

    /// File backing a namespace
    pub fn store_path(&self, namespace: &str) -> PathBuf {
        self.data_dir.join(format!("{}.db", namespace))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn slot(&self, namespace: &str) -> Result<StoreSlot> {
        let stores = self
            .stores
            .read()
            .map_err(|_| QaError::Internal("namespace registry lock poisoned".to_string()))?;
        if let Some(slot) = stores.get(namespace) {
            return Ok(Arc::clone(slot));
        }
        drop(stores);

        let mut stores = self
            .stores
            .write()
            .map_err(|_| QaError::Internal("namespace registry lock poisoned".to_string()))?;
        Ok(Arc::clone(stores.entry(namespace.to_string()).or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lazy_open_is_idempotent() {
        let dir = tempdir().unwrap();
        let base = KnowledgeBase::new(dir.path(), Duration::from_secs(1));

        assert!(!base.store_path("g1").exists());

        let first = base.store("g1").unwrap();
        let second = base.store("g1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(base.store_path("g1").exists());
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let dir = tempdir().unwrap();
        let base = KnowledgeBase::new(dir.path(), Duration::from_secs(1));

        base.store("g1").unwrap().upsert("q", "from g1").unwrap();
        base.store("g2").unwrap().upsert("q", "from g2").unwrap();

        assert_eq!(base.store("g1").unwrap().get("q").unwrap().unwrap().answer, "from g1");
        assert_eq!(base.store("g2").unwrap().get("q").unwrap().unwrap().answer, "from g2");
    }

    #[test]
    fn test_invalid_namespace_never_touches_disk() {
        let dir = tempdir().unwrap();
        let base = KnowledgeBase::new(dir.path(), Duration::from_secs(1));

        let err = base.store("../escape").err().unwrap();
        assert!(err.is_fatal());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

//! JSON-file switch gate
//!
//! Persists `{namespace: enabled}` to a JSON file. Writes go to a temp file
//! that is renamed over the old one, so readers never see a partial file.

use qa_common::{QaError, SwitchGate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct JsonSwitchGate {
    path: PathBuf,
    default_enabled: bool,
    state: RwLock<BTreeMap<String, bool>>,
}

impl JsonSwitchGate {
    /// Load state from `path`; a missing file means nothing was toggled yet
    pub fn load(path: impl Into<PathBuf>, default_enabled: bool) -> qa_common::Result<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No switch file at {}, using defaults", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            default_enabled,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &BTreeMap<String, bool>) -> qa_common::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SwitchGate for JsonSwitchGate {
    fn is_enabled(&self, namespace: &str) -> bool {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.get(namespace).copied().unwrap_or(self.default_enabled)
    }

    fn set_enabled(&self, namespace: &str, enabled: bool) -> qa_common::Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| QaError::Internal("switch state lock poisoned".to_string()))?;

        let previous = state.insert(namespace.to_string(), enabled);
        if let Err(e) = self.persist(&state) {
            warn!("Failed to save switch state: {}", e);
            // Keep memory in line with what is on disk
            match previous {
                Some(value) => state.insert(namespace.to_string(), value),
                None => state.remove(namespace),
            };
            return Err(e);
        }
        Ok(())
    }
}

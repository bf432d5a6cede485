//! Switch Gate
//!
//! Per-namespace on/off flag consulted before any matching or CRUD work.
//! Persistence belongs to the embedding application; `MemorySwitchGate`
//! covers tests and ephemeral deployments.

use crate::error::Result;
use std::collections::HashMap;
use std::sync::RwLock;

pub trait SwitchGate: Send + Sync {
    fn is_enabled(&self, namespace: &str) -> bool;

    fn set_enabled(&self, namespace: &str, enabled: bool) -> Result<()>;
}

#[derive(Debug)]
pub struct MemorySwitchGate {
    default_enabled: bool,
    overrides: RwLock<HashMap<String, bool>>,
}

impl MemorySwitchGate {
    pub fn new(default_enabled: bool) -> Self {
        Self {
            default_enabled,
            overrides: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySwitchGate {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SwitchGate for MemorySwitchGate {
    fn is_enabled(&self, namespace: &str) -> bool {
        let overrides = self
            .overrides
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        overrides
            .get(namespace)
            .copied()
            .unwrap_or(self.default_enabled)
    }

    fn set_enabled(&self, namespace: &str, enabled: bool) -> Result<()> {
        self.overrides
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(namespace.to_string(), enabled);
        Ok(())
    }
}

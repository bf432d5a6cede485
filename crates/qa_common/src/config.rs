//! QA Configuration v0.4.0
//!
//! Configuration lives in $XDG_CONFIG_HOME/qa/config.toml
//!
//! v0.2.0: Thresholds moved out of code, per-namespace overrides
//! v0.3.0: Trigger scope, engine deadline
//! v0.4.0: Switch file and display settings for qactl

use crate::error::{QaError, Result};
use crate::matcher::{MatchThresholds, SuggestPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "qa";
const CONFIG_FILE: &str = "config.toml";
const SWITCH_FILE: &str = "switch_status.json";

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one SQLite file per namespace
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// SQLite busy timeout (milliseconds)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join(CONFIG_DIR)
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Threshold override for a single namespace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containment_threshold: Option<f64>,
}

/// Matching thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Global similarity must exceed this
    #[serde(default = "default_global_threshold")]
    pub global_threshold: f64,

    /// Containment ratio must reach this
    #[serde(default = "default_containment_threshold")]
    pub containment_threshold: f64,

    #[serde(default)]
    pub namespaces: BTreeMap<String, ThresholdOverride>,
}

fn default_global_threshold() -> f64 {
    0.75
}

fn default_containment_threshold() -> f64 {
    0.67
}

/// Clamp into [0, 1]; NaN falls back to the default
fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl MatchingConfig {
    /// Effective thresholds for a namespace, overrides applied and clamped
    pub fn thresholds_for(&self, namespace: &str) -> MatchThresholds {
        let overrides = self.namespaces.get(namespace);
        let global = overrides
            .and_then(|o| o.global_threshold)
            .unwrap_or(self.global_threshold);
        let containment = overrides
            .and_then(|o| o.containment_threshold)
            .unwrap_or(self.containment_threshold);

        MatchThresholds {
            global: clamp_unit(global, default_global_threshold()),
            containment: clamp_unit(containment, default_containment_threshold()),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            global_threshold: default_global_threshold(),
            containment_threshold: default_containment_threshold(),
            namespaces: BTreeMap::new(),
        }
    }
}

/// Keyword suggestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_suggest_enabled")]
    pub enabled: bool,

    /// A keyword must be shared by at least this many questions
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,

    /// Maximum questions listed in one suggestion
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

fn default_suggest_enabled() -> bool {
    true
}

fn default_min_questions() -> usize {
    2
}

fn default_max_questions() -> usize {
    5
}

impl SuggestConfig {
    pub fn policy(&self) -> SuggestPolicy {
        let min_questions = self.min_questions.max(1);
        SuggestPolicy {
            min_questions,
            max_questions: self.max_questions.max(min_questions),
        }
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            enabled: default_suggest_enabled(),
            min_questions: default_min_questions(),
            max_questions: default_max_questions(),
        }
    }
}

/// Which namespaces share trigger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerScope {
    /// Each namespace cools down independently
    #[default]
    Namespace,
    /// One process-wide keyword map
    Global,
}

impl TriggerScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerScope::Namespace => "namespace",
            TriggerScope::Global => "global",
        }
    }
}

/// Suggestion trigger rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    #[serde(default)]
    pub scope: TriggerScope,
}

fn default_cooldown_secs() -> u64 {
    300 // 5 minutes
}

impl TriggerConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        let secs = self.cooldown_secs.min((i64::MAX / 1000) as u64) as i64;
        chrono::Duration::seconds(secs)
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            scope: TriggerScope::Namespace,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deadline for reading a namespace snapshot during a match (milliseconds)
    #[serde(default = "default_match_timeout_ms")]
    pub match_timeout_ms: u64,
}

fn default_match_timeout_ms() -> u64 {
    2000
}

impl EngineConfig {
    pub fn match_timeout(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_timeout_ms: default_match_timeout_ms(),
        }
    }
}

/// On/off switch persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// State for namespaces never toggled
    #[serde(default = "default_switch_enabled")]
    pub default_enabled: bool,

    /// Switch state file (defaults to <data_dir>/switch_status.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_switch_enabled() -> bool {
    true
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            default_enabled: default_switch_enabled(),
            file: None,
        }
    }
}

/// Authorization settings for the chat adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Users allowed to manage every group and toggle the switch
    #[serde(default)]
    pub root_users: Vec<String>,
}

/// Reply rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Append the match score to fuzzy answers
    #[serde(default)]
    pub show_confidence: bool,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    10
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_confidence: false,
            page_size: default_page_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QaConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub suggest: SuggestConfig,

    #[serde(default)]
    pub trigger: TriggerConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub switch: SwitchConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl QaConfig {
    /// Load from the default path, falling back to defaults
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Load from an explicit path; unreadable or invalid files are errors
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| QaError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| QaError::Config(e.to_string()))
    }

    /// Save to the given path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| QaError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn switch_file(&self) -> PathBuf {
        self.switch
            .file
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join(SWITCH_FILE))
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QaConfig::default();
        assert_eq!(config.matching.global_threshold, 0.75);
        assert_eq!(config.matching.containment_threshold, 0.67);
        assert_eq!(config.trigger.cooldown_secs, 300);
        assert_eq!(config.trigger.scope, TriggerScope::Namespace);
        assert!(config.suggest.enabled);
        assert!(config.switch.default_enabled);
        assert_eq!(config.display.page_size, 10);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = QaConfig::from_toml(
            r#"
            [matching]
            global_threshold = 0.45

            [trigger]
            scope = "global"
            "#,
        )
        .unwrap();
        assert_eq!(config.matching.global_threshold, 0.45);
        assert_eq!(config.matching.containment_threshold, 0.67);
        assert_eq!(config.trigger.scope, TriggerScope::Global);
        assert_eq!(config.engine.match_timeout_ms, 2000);
    }

    #[test]
    fn test_namespace_overrides() {
        let config = QaConfig::from_toml(
            r#"
            [matching]
            global_threshold = 0.75
            containment_threshold = 0.8

            [matching.namespaces."123456"]
            global_threshold = 0.9
            "#,
        )
        .unwrap();

        let own = config.matching.thresholds_for("123456");
        assert_eq!(own.global, 0.9);
        assert_eq!(own.containment, 0.8);

        let other = config.matching.thresholds_for("654321");
        assert_eq!(other.global, 0.75);
        assert_eq!(other.containment, 0.8);
    }

    #[test]
    fn test_threshold_clamping() {
        let mut config = MatchingConfig::default();
        config.global_threshold = 1.5;
        config.containment_threshold = -0.2;
        let t = config.thresholds_for("g");
        assert_eq!(t.global, 1.0);
        assert_eq!(t.containment, 0.0);

        config.global_threshold = f64::NAN;
        assert_eq!(config.thresholds_for("g").global, 0.75);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = QaConfig::from_toml("[matching\nglobal_threshold = ").unwrap_err();
        assert!(matches!(err, QaError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = QaConfig::default();
        config.auth.root_users = vec!["10001".to_string()];
        config.matching.namespaces.insert(
            "g1".to_string(),
            ThresholdOverride {
                global_threshold: Some(0.6),
                containment_threshold: None,
            },
        );
        config.save(&path).unwrap();

        let loaded = QaConfig::load_from(&path).unwrap();
        assert_eq!(loaded.auth.root_users, vec!["10001".to_string()]);
        assert_eq!(loaded.matching.thresholds_for("g1").global, 0.6);
        assert!(loaded.switch.file.is_none());
    }

    #[test]
    fn test_switch_file_defaults_to_data_dir() {
        let mut config = QaConfig::default();
        config.storage.data_dir = PathBuf::from("/tmp/qa-data");
        assert_eq!(config.switch_file(), PathBuf::from("/tmp/qa-data/switch_status.json"));
    }

    #[test]
    fn test_suggest_policy_sanitized() {
        let config = SuggestConfig {
            enabled: true,
            min_questions: 0,
            max_questions: 0,
        };
        let policy = config.policy();
        assert_eq!(policy.min_questions, 1);
        assert_eq!(policy.max_questions, 1);
    }
}

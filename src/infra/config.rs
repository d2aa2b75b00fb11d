// src/infra/config.rs - Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::hints::{HintCategory, ProficiencyLevel};
use crate::infra::errors::HintError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine settings. Immutable for the lifetime of an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Categories the engine may emit.
    #[serde(default = "all_categories")]
    pub enabled_categories: BTreeSet<HintCategory>,
    /// Level used when no learning state has been persisted yet.
    #[serde(default)]
    pub initial_proficiency: ProficiencyLevel,
    /// Recompute proficiency from accept/defer counts.
    #[serde(default = "default_true")]
    pub adaptive_learning: bool,
    /// Let safety-critical triggers through unconditionally.
    #[serde(default = "default_true")]
    pub emergency_guidance: bool,
    /// Fixed seed for the random source. Absent means entropy-seeded.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled_categories: all_categories(),
            initial_proficiency: ProficiencyLevel::New,
            adaptive_learning: true,
            emergency_guidance: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// The set the engine actually gates against: emergency guidance is
    /// present exactly when `emergency_guidance` is on.
    pub fn effective_categories(&self) -> BTreeSet<HintCategory> {
        let mut set = self.enabled_categories.clone();
        if self.emergency_guidance {
            set.insert(HintCategory::EmergencyGuidance);
        } else {
            set.remove(&HintCategory::EmergencyGuidance);
        }
        set
    }
}

fn all_categories() -> BTreeSet<HintCategory> {
    HintCategory::ALL.into_iter().collect()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Key the learning state is stored under (one per user).
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Override for the database / JSON file location.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            profile: default_profile(),
            path: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(ref p) = self.path {
            return p.clone();
        }
        match self.backend {
            StorageBackend::Json => paths::state_file_path(&self.profile),
            _ => paths::db_path(),
        }
    }
}

fn default_profile() -> String {
    "default".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(HintError::from)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| HintError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.engine.enabled_categories.len(), 8);
        assert_eq!(c.engine.initial_proficiency, ProficiencyLevel::New);
        assert!(c.engine.adaptive_learning);
        assert!(c.engine.emergency_guidance);
        assert!(c.engine.seed.is_none());
        assert_eq!(c.storage.backend, StorageBackend::Sqlite);
        assert_eq!(c.storage.profile, "default");
        assert_eq!(c.logging.level, "warn");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.enabled_categories.len(), 8);
        assert!(config.engine.adaptive_learning);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[engine]
enabled_categories = ["swipe_gesture", "onboarding"]
initial_proficiency = "learning"
adaptive_learning = false
emergency_guidance = false
seed = 7

[storage]
backend = "json"
profile = "alice"
path = "/tmp/alice.json"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.enabled_categories.len(), 2);
        assert!(config
            .engine
            .enabled_categories
            .contains(&HintCategory::Onboarding));
        assert_eq!(config.engine.initial_proficiency, ProficiencyLevel::Learning);
        assert!(!config.engine.adaptive_learning);
        assert!(!config.engine.emergency_guidance);
        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.storage.profile, "alice");
        assert_eq!(
            config.storage.resolved_path(),
            PathBuf::from("/tmp/alice.json")
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unknown_category_rejected() {
        let toml_str = r#"
[engine]
enabled_categories = ["confetti"]
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_effective_categories_follow_emergency_flag() {
        let mut engine = EngineConfig {
            enabled_categories: [HintCategory::SwipeGesture].into_iter().collect(),
            ..EngineConfig::default()
        };
        let set = engine.effective_categories();
        assert!(set.contains(&HintCategory::EmergencyGuidance));
        assert_eq!(set.len(), 2);

        engine.emergency_guidance = false;
        engine.enabled_categories.insert(HintCategory::EmergencyGuidance);
        let set = engine.effective_categories();
        assert!(!set.contains(&HintCategory::EmergencyGuidance));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.engine.enabled_categories,
            config.engine.enabled_categories
        );
        assert_eq!(deserialized.storage.profile, config.storage.profile);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_user_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\ninitial_proficiency = \"guru\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        let hint_err = err.downcast_ref::<HintError>().unwrap();
        assert!(hint_err.is_user_error());
        assert!(err.to_string().contains("config.toml"));
    }
}

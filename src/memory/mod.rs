// src/memory/mod.rs - Persistence for learning state

pub mod json_file;
pub mod schema;
pub mod store;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::infra::config::{StorageBackend, StorageConfig};
use crate::learner::LearningState;

pub use json_file::JsonFileStore;
pub use store::SqliteLearningStore;

/// Where the engine reads and writes its learning state.
///
/// The storage format is up to the implementor. Callers treat failures as
/// non-fatal: a failed load means a fresh user, a failed save is retried on
/// the next mutation.
pub trait LearningStore: Send {
    fn load(&self) -> anyhow::Result<Option<LearningState>>;

    fn save(&self, state: &LearningState) -> anyhow::Result<()>;

    /// Human-readable location, for status output.
    fn describe(&self) -> String;
}

/// Process-local store. Clones share the same slot, so a test can keep one
/// clone to inspect what the engine persisted.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    slot: Arc<Mutex<Option<LearningState>>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-persisted state.
    pub fn with_state(state: LearningState) -> Self {
        let store = Self::default();
        if let Ok(mut slot) = store.slot.lock() {
            *slot = Some(state);
        }
        store
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last successfully saved state.
    pub fn snapshot(&self) -> Option<LearningState> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl LearningStore for InMemoryStore {
    fn load(&self) -> anyhow::Result<Option<LearningState>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, state: &LearningState) -> anyhow::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("in-memory store configured to fail saves");
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))?;
        *slot = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

/// Open the backend named in the storage config.
pub fn open_store(config: &StorageConfig) -> anyhow::Result<Box<dyn LearningStore>> {
    let store: Box<dyn LearningStore> = match config.backend {
        StorageBackend::Sqlite => Box::new(SqliteLearningStore::open(
            &config.resolved_path(),
            &config.profile,
        )?),
        StorageBackend::Json => Box::new(JsonFileStore::new(config.resolved_path())),
        StorageBackend::Memory => Box::new(InMemoryStore::new()),
    };
    tracing::debug!("Learning store: {}", store.describe());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::ProficiencyLevel;

    #[test]
    fn test_in_memory_clones_share_state() {
        let store = InMemoryStore::new();
        let observer = store.clone();
        store
            .save(&LearningState::new(ProficiencyLevel::Expert))
            .unwrap();
        assert_eq!(observer.save_count(), 1);
        assert_eq!(
            observer.snapshot().map(|s| s.proficiency()),
            Some(ProficiencyLevel::Expert)
        );
    }

    #[test]
    fn test_in_memory_failing_saves() {
        let store = InMemoryStore::new();
        store.set_fail_saves(true);
        assert!(store.save(&LearningState::default()).is_err());
        assert_eq!(store.save_count(), 0);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_open_store_json_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Json,
            profile: "carol".into(),
            path: Some(dir.path().join("carol.json")),
        };
        let store = open_store(&config).unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(store.describe().contains("carol.json"));
    }
}

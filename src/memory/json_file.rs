// src/memory/json_file.rs - Learning state as a single JSON document
//
// Writes are atomic (temp file + rename) so a crash mid-write leaves the
// previous state intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::LearningStore;
use crate::learner::LearningState;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state.json".into());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl LearningStore for JsonFileStore {
    fn load(&self) -> anyhow::Result<Option<LearningState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let state: LearningState = serde_json::from_str(&content)?;
        // Re-apply the history bound in case the file was edited by hand.
        let state = LearningState::from_parts(
            state.proficiency(),
            state.counters(),
            state.last_shown_at(),
            state.entries(),
        );
        Ok(Some(state))
    }

    fn save(&self, state: &LearningState) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.tmp_path();

        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json {}", self.path.display())
    }
}

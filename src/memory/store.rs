// src/memory/store.rs - SQLite persistence for learning state

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{schema, LearningStore};
use crate::hints::{HintCategory, ProficiencyLevel};
use crate::learner::{InteractionCounters, LearningState};

/// Learning state for one profile, stored in SQLite.
pub struct SqliteLearningStore {
    conn: Connection,
    profile: String,
}

impl SqliteLearningStore {
    pub fn new(conn: Connection, profile: &str) -> Self {
        Self {
            conn,
            profile: profile.to_string(),
        }
    }

    /// Open (or create) the database at the given path.
    pub fn open(path: &Path, profile: &str) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self::new(conn, profile))
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory(profile: &str) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self::new(conn, profile))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// All profiles with persisted state.
    pub fn profiles(&self) -> anyhow::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT profile FROM hint_profiles ORDER BY profile")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Remove this profile's state entirely. History goes with it (cascade).
    pub fn delete_profile(&self) -> anyhow::Result<()> {
        self.conn.execute(
            "DELETE FROM hint_profiles WHERE profile = ?1",
            params![self.profile],
        )?;
        Ok(())
    }

    fn load_history(&self) -> anyhow::Result<Vec<(HintCategory, DateTime<Utc>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, shown_at FROM hint_history
             WHERE profile = ?1 ORDER BY category, seq",
        )?;
        let rows = stmt.query_map(params![self.profile], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (category, shown_at) = row?;
            let (Ok(category), Some(shown_at)) =
                (category.parse::<HintCategory>(), parse_timestamp(&shown_at))
            else {
                tracing::warn!(
                    "Skipping unreadable history row for '{}': {} at {}",
                    self.profile,
                    category,
                    shown_at
                );
                continue;
            };
            entries.push((category, shown_at));
        }
        Ok(entries)
    }
}

impl LearningStore for SqliteLearningStore {
    fn load(&self) -> anyhow::Result<Option<LearningState>> {
        let row = self
            .conn
            .query_row(
                "SELECT proficiency, transitions_accepted, transitions_deferred, last_shown_at
                 FROM hint_profiles WHERE profile = ?1",
                params![self.profile],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((proficiency, accepted, deferred, last_shown_at)) = row else {
            return Ok(None);
        };

        let proficiency = proficiency.parse::<ProficiencyLevel>().unwrap_or_else(|e| {
            tracing::warn!("{e}; treating profile '{}' as new", self.profile);
            ProficiencyLevel::New
        });
        let counters = InteractionCounters {
            transitions_accepted: accepted.max(0) as u64,
            transitions_deferred: deferred.max(0) as u64,
        };
        let last_shown_at = last_shown_at.as_deref().and_then(parse_timestamp);

        Ok(Some(LearningState::from_parts(
            proficiency,
            counters,
            last_shown_at,
            self.load_history()?,
        )))
    }

    fn save(&self, state: &LearningState) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        let counters = state.counters();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO hint_profiles (profile, proficiency, transitions_accepted,
             transitions_deferred, last_shown_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(profile) DO UPDATE SET
                proficiency = excluded.proficiency,
                transitions_accepted = excluded.transitions_accepted,
                transitions_deferred = excluded.transitions_deferred,
                last_shown_at = excluded.last_shown_at,
                updated_at = excluded.updated_at",
            params![
                self.profile,
                state.proficiency().as_str(),
                counters.transitions_accepted as i64,
                counters.transitions_deferred as i64,
                state.last_shown_at().map(|t| t.to_rfc3339()),
                now
            ],
        )?;

        tx.execute(
            "DELETE FROM hint_history WHERE profile = ?1",
            params![self.profile],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO hint_history (profile, category, seq, shown_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for category in HintCategory::ALL {
                for (seq, shown_at) in state.history(category).enumerate() {
                    insert.execute(params![
                        self.profile,
                        category.as_str(),
                        seq as i64,
                        shown_at.to_rfc3339()
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn describe(&self) -> String {
        let location = self
            .conn
            .path()
            .filter(|p| !p.is_empty())
            .unwrap_or(":memory:");
        format!("sqlite {} (profile '{}')", location, self.profile)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

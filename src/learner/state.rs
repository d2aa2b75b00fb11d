// src/learner/state.rs - Per-user learning state owned by the engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::adaptation::{success_rate, HintOutcome};
use crate::hints::{HintCategory, ProficiencyLevel};

/// Only the most recent showings per category are kept.
pub const MAX_HISTORY_PER_CATEGORY: usize = 10;

/// Aggregate accept/defer counters. Never decrease within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounters {
    pub transitions_accepted: u64,
    pub transitions_deferred: u64,
}

impl InteractionCounters {
    pub fn total(&self) -> u64 {
        self.transitions_accepted + self.transitions_deferred
    }

    pub(crate) fn increment(&mut self, outcome: HintOutcome) {
        match outcome {
            HintOutcome::Accepted => self.transitions_accepted += 1,
            HintOutcome::Deferred => self.transitions_deferred += 1,
        }
    }
}

/// Show history, counters and proficiency for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningState {
    history: BTreeMap<HintCategory, VecDeque<DateTime<Utc>>>,
    counters: InteractionCounters,
    last_shown_at: Option<DateTime<Utc>>,
    proficiency: ProficiencyLevel,
}

impl LearningState {
    /// Empty state (no history, zero counters) at the given level.
    pub fn new(proficiency: ProficiencyLevel) -> Self {
        Self {
            proficiency,
            ..Self::default()
        }
    }

    /// Rebuild a state from persisted pieces. History entries are replayed
    /// oldest first so the per-category bound holds even for oversized input.
    pub fn from_parts(
        proficiency: ProficiencyLevel,
        counters: InteractionCounters,
        last_shown_at: Option<DateTime<Utc>>,
        mut entries: Vec<(HintCategory, DateTime<Utc>)>,
    ) -> Self {
        entries.sort_by_key(|(_, at)| *at);
        let mut state = Self::new(proficiency);
        for (category, at) in entries {
            state.push_history(category, at);
        }
        state.counters = counters;
        state.last_shown_at = last_shown_at.or(state.last_shown_at);
        state
    }

    pub fn proficiency(&self) -> ProficiencyLevel {
        self.proficiency
    }

    pub fn counters(&self) -> InteractionCounters {
        self.counters
    }

    pub fn last_shown_at(&self) -> Option<DateTime<Utc>> {
        self.last_shown_at
    }

    /// Showings of `category`, oldest first.
    pub fn history(&self, category: HintCategory) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.history
            .get(&category)
            .into_iter()
            .flat_map(|entries| entries.iter().copied())
    }

    pub fn history_len(&self, category: HintCategory) -> usize {
        self.history.get(&category).map_or(0, VecDeque::len)
    }

    /// Most recent showing of `category`, if any.
    pub fn last_shown(&self, category: HintCategory) -> Option<DateTime<Utc>> {
        self.history.get(&category).and_then(|e| e.back().copied())
    }

    /// Flattened `(category, shown_at)` pairs, for storage backends.
    pub fn entries(&self) -> Vec<(HintCategory, DateTime<Utc>)> {
        self.history
            .iter()
            .flat_map(|(c, entries)| entries.iter().map(move |at| (*c, *at)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.history.values().all(VecDeque::is_empty) && self.counters.total() == 0
    }

    pub(crate) fn record_shown(&mut self, category: HintCategory, at: DateTime<Utc>) {
        self.push_history(category, at);
    }

    pub(crate) fn record_outcome(&mut self, outcome: HintOutcome) {
        self.counters.increment(outcome);
    }

    pub(crate) fn set_proficiency(&mut self, level: ProficiencyLevel) {
        self.proficiency = level;
    }

    fn push_history(&mut self, category: HintCategory, at: DateTime<Utc>) {
        let entries = self.history.entry(category).or_default();
        entries.push_back(at);
        while entries.len() > MAX_HISTORY_PER_CATEGORY {
            entries.pop_front();
        }
        self.last_shown_at = Some(at);
    }

    pub fn stats(&self) -> LearningStats {
        let per_category: Vec<(HintCategory, usize)> = HintCategory::ALL
            .into_iter()
            .map(|c| (c, self.history_len(c)))
            .filter(|(_, n)| *n > 0)
            .collect();
        LearningStats {
            proficiency: self.proficiency,
            total_shown: per_category.iter().map(|(_, n)| n).sum(),
            per_category,
            transitions_accepted: self.counters.transitions_accepted,
            transitions_deferred: self.counters.transitions_deferred,
            success_rate: success_rate(&self.counters),
            last_shown_at: self.last_shown_at,
        }
    }
}

/// Read-only summary of a [`LearningState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStats {
    pub proficiency: ProficiencyLevel,
    /// Showings still retained in history (at most 10 per category).
    pub total_shown: usize,
    pub per_category: Vec<(HintCategory, usize)>,
    pub transitions_accepted: u64,
    pub transitions_deferred: u64,
    pub success_rate: f64,
    pub last_shown_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_history_is_bounded() {
        let mut state = LearningState::new(ProficiencyLevel::New);
        let t0 = Utc::now();
        for i in 0..25 {
            state.record_shown(HintCategory::SwipeGesture, t0 + Duration::seconds(i));
        }
        assert_eq!(state.history_len(HintCategory::SwipeGesture), 10);

        // Oldest were evicted: the first retained entry is #15
        let first = state.history(HintCategory::SwipeGesture).next().unwrap();
        assert_eq!(first, t0 + Duration::seconds(15));
        assert_eq!(
            state.last_shown(HintCategory::SwipeGesture),
            Some(t0 + Duration::seconds(24))
        );
    }

    #[test]
    fn test_record_shown_updates_last_shown_at() {
        let mut state = LearningState::default();
        assert!(state.last_shown_at().is_none());
        let t = Utc::now();
        state.record_shown(HintCategory::Onboarding, t);
        assert_eq!(state.last_shown_at(), Some(t));
        assert_eq!(state.history_len(HintCategory::TapTransition), 0);
    }

    #[test]
    fn test_from_parts_enforces_bound_and_order() {
        let t0 = Utc::now();
        let entries: Vec<_> = (0..14)
            .rev()
            .map(|i| (HintCategory::ContextualTip, t0 + Duration::minutes(i)))
            .collect();
        let state = LearningState::from_parts(
            ProficiencyLevel::Learning,
            InteractionCounters {
                transitions_accepted: 3,
                transitions_deferred: 1,
            },
            None,
            entries,
        );
        assert_eq!(state.history_len(HintCategory::ContextualTip), 10);
        assert_eq!(
            state.last_shown(HintCategory::ContextualTip),
            Some(t0 + Duration::minutes(13))
        );
        assert_eq!(state.last_shown_at(), Some(t0 + Duration::minutes(13)));
        assert_eq!(state.counters().transitions_accepted, 3);
        assert_eq!(state.proficiency(), ProficiencyLevel::Learning);
    }

    #[test]
    fn test_stats_summary() {
        let mut state = LearningState::default();
        let t = Utc::now();
        state.record_shown(HintCategory::Onboarding, t);
        state.record_shown(HintCategory::Onboarding, t);
        state.record_shown(HintCategory::HapticPulse, t);
        state.record_outcome(HintOutcome::Accepted);
        state.record_outcome(HintOutcome::Deferred);

        let stats = state.stats();
        assert_eq!(stats.total_shown, 3);
        assert_eq!(
            stats.per_category,
            vec![(HintCategory::Onboarding, 2), (HintCategory::HapticPulse, 1)]
        );
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_roundtrip_keeps_history() {
        let mut state = LearningState::new(ProficiencyLevel::Intermediate);
        state.record_shown(HintCategory::DragIndicator, Utc::now());
        state.record_outcome(HintOutcome::Accepted);

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"drag_indicator\""));
        let parsed: LearningState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}

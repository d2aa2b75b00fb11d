// src/engine/mod.rs - Decision engine: which hint, if any, and learning from responses

pub mod random;
pub mod server;

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::hints::policy::{self, FrequencyPolicy};
use crate::hints::{HintCategory, ProficiencyLevel, TriggerKind};
use crate::infra::config::EngineConfig;
use crate::learner::{adapt, HintOutcome, LearningState};
use crate::memory::LearningStore;

use random::{RandomSource, SeededRandom};

/// Owns the learning state for one user and decides which hints to show.
///
/// Every mutation is persisted immediately. Persistence failures are logged
/// and retried on the next mutation; they never reach the caller.
pub struct DecisionEngine {
    config: EngineConfig,
    enabled: BTreeSet<HintCategory>,
    state: LearningState,
    store: Box<dyn LearningStore>,
    rng: Box<dyn RandomSource>,
    pending_save: bool,
}

impl DecisionEngine {
    /// Build an engine, seeding randomness from `config.seed` when present.
    pub fn new(config: EngineConfig, store: Box<dyn LearningStore>) -> Self {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        };
        Self::with_random(config, store, rng)
    }

    pub fn with_random(
        config: EngineConfig,
        store: Box<dyn LearningStore>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => {
                debug!(
                    "Loaded learning state from {} (proficiency: {})",
                    store.describe(),
                    state.proficiency()
                );
                state
            }
            Ok(None) => LearningState::new(config.initial_proficiency),
            Err(e) => {
                warn!(
                    "Failed to load learning state from {}: {}; starting fresh",
                    store.describe(),
                    e
                );
                LearningState::new(config.initial_proficiency)
            }
        };

        Self {
            enabled: config.effective_categories(),
            config,
            state,
            store,
            rng,
            pending_save: false,
        }
    }

    pub fn state(&self) -> &LearningState {
        &self.state
    }

    pub fn proficiency(&self) -> ProficiencyLevel {
        self.state.proficiency()
    }

    /// Probability and cooldown for the current proficiency.
    pub fn current_policy(&self) -> FrequencyPolicy {
        policy::policy(self.state.proficiency().frequency_class())
    }

    pub fn is_enabled(&self, category: HintCategory) -> bool {
        self.enabled.contains(&category)
    }

    /// True when the last save failed and has not been retried yet.
    pub fn has_pending_save(&self) -> bool {
        self.pending_save
    }

    /// Decide whether a hint should be shown for `trigger` at `now`.
    ///
    /// Safety-critical triggers always get emergency guidance (unless the
    /// configuration turned emergency guidance off). Everything else must pass
    /// the probability draw, the per-category cooldown, and the enabled set.
    pub fn evaluate(&mut self, trigger: &TriggerKind, now: DateTime<Utc>) -> Option<HintCategory> {
        let candidate = self.select_candidate(trigger);

        if trigger.is_safety_critical() {
            if !self.is_enabled(candidate) {
                debug!("Rejecting {candidate} for {trigger}: emergency guidance disabled");
                return None;
            }
            info!("Admitting {candidate} for {trigger} (safety-critical)");
            return Some(candidate);
        }

        let policy = self.current_policy();
        let draw = self.rng.next_unit();
        if draw >= policy.show_probability {
            debug!(
                "Rejecting {candidate} for {trigger}: draw {:.3} >= probability {:.2}",
                draw, policy.show_probability
            );
            return None;
        }

        if let Some(last) = self.state.last_shown(candidate) {
            if !policy.cooldown_elapsed(last, now) {
                debug!(
                    "Rejecting {candidate} for {trigger}: cooling down since {}",
                    last.to_rfc3339()
                );
                return None;
            }
        }

        if !self.is_enabled(candidate) {
            debug!("Rejecting {candidate} for {trigger}: category not enabled");
            return None;
        }

        info!(
            "Admitting {candidate} for {trigger} (proficiency: {})",
            self.state.proficiency()
        );
        Some(candidate)
    }

    fn select_candidate(&mut self, trigger: &TriggerKind) -> HintCategory {
        let preferred = policy::preferred_categories(self.state.proficiency());
        match trigger {
            TriggerKind::FirstTimeUser => HintCategory::Onboarding,
            TriggerKind::IntegrationFailure | TriggerKind::CriticalMoment => {
                HintCategory::EmergencyGuidance
            }
            TriggerKind::AccessibilityModeActive => HintCategory::AccessibilityAnnouncement,
            TriggerKind::UserStruggling => preferred
                .first()
                .copied()
                .unwrap_or(HintCategory::ContextualTip),
            TriggerKind::ExtendedUsage(_)
            | TriggerKind::ManualRequest
            | TriggerKind::TimerElapsed(_) => {
                if preferred.is_empty() {
                    HintCategory::SwipeGesture
                } else {
                    preferred[self.rng.pick(preferred.len())]
                }
            }
        }
    }

    /// The presentation layer displayed `category` at `now`.
    pub fn record_shown(&mut self, category: HintCategory, now: DateTime<Utc>) {
        self.state.record_shown(category, now);
        self.persist();
    }

    /// The user responded to a displayed hint. Returns the (possibly new)
    /// proficiency level.
    pub fn record_outcome(&mut self, outcome: HintOutcome, now: DateTime<Utc>) -> ProficiencyLevel {
        self.state.record_outcome(outcome);

        if self.config.adaptive_learning {
            let before = self.state.proficiency();
            let after = adapt(before, &self.state.counters());
            if after != before {
                info!(
                    "Proficiency {} -> {} at {} ({} accepted, {} deferred)",
                    before,
                    after,
                    now.to_rfc3339(),
                    self.state.counters().transitions_accepted,
                    self.state.counters().transitions_deferred
                );
                self.state.set_proficiency(after);
            }
        }

        self.persist();
        self.state.proficiency()
    }

    /// Forget everything learned: empty history, zero counters, `New`.
    pub fn reset(&mut self) {
        info!("Resetting learning state");
        self.state = LearningState::new(ProficiencyLevel::New);
        self.persist();
    }

    /// Explicit override, bypassing adaptation.
    pub fn set_proficiency(&mut self, level: ProficiencyLevel) {
        info!("Proficiency overridden to {level}");
        self.state.set_proficiency(level);
        self.persist();
    }

    /// Retry a failed save without mutating anything. Returns true when the
    /// state on disk is current.
    pub fn flush(&mut self) -> bool {
        if self.pending_save {
            self.persist();
        }
        !self.pending_save
    }

    fn persist(&mut self) {
        match self.store.save(&self.state) {
            Ok(()) => {
                if self.pending_save {
                    debug!("Recovered pending save to {}", self.store.describe());
                }
                self.pending_save = false;
            }
            Err(e) => {
                warn!(
                    "Failed to save learning state to {}: {}",
                    self.store.describe(),
                    e
                );
                self.pending_save = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use chrono::Duration;
    use random::ScriptedRandom;

    fn engine_with(config: EngineConfig, draw: f64) -> (DecisionEngine, InMemoryStore) {
        let store = InMemoryStore::new();
        let engine = DecisionEngine::with_random(
            config,
            Box::new(store.clone()),
            Box::new(ScriptedRandom::constant(draw)),
        );
        (engine, store)
    }

    #[test]
    fn test_candidate_mapping() {
        let (mut engine, _) = engine_with(EngineConfig::default(), 0.0);
        let now = Utc::now();
        assert_eq!(
            engine.evaluate(&TriggerKind::FirstTimeUser, now),
            Some(HintCategory::Onboarding)
        );
        assert_eq!(
            engine.evaluate(&TriggerKind::AccessibilityModeActive, now),
            Some(HintCategory::AccessibilityAnnouncement)
        );
        // New prefers Onboarding first
        assert_eq!(
            engine.evaluate(&TriggerKind::UserStruggling, now),
            Some(HintCategory::Onboarding)
        );
        // Scripted pick 0 -> first preferred entry
        assert_eq!(
            engine.evaluate(&TriggerKind::ManualRequest, now),
            Some(HintCategory::Onboarding)
        );
    }

    #[test]
    fn test_random_pick_uses_preferred_list() {
        let store = InMemoryStore::new();
        let mut engine = DecisionEngine::with_random(
            EngineConfig::default(),
            Box::new(store),
            Box::new(ScriptedRandom::constant(0.0).with_picks(vec![2])),
        );
        assert_eq!(
            engine.evaluate(&TriggerKind::TimerElapsed(std::time::Duration::from_secs(30)), Utc::now()),
            Some(HintCategory::TapTransition)
        );
    }

    #[test]
    fn test_disabled_falls_back_to_defaults_but_never_shows() {
        let config = EngineConfig {
            initial_proficiency: ProficiencyLevel::Disabled,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with(config, 0.0);
        let now = Utc::now();
        assert_eq!(engine.evaluate(&TriggerKind::UserStruggling, now), None);
        assert_eq!(engine.evaluate(&TriggerKind::ManualRequest, now), None);
        assert_eq!(
            engine.evaluate(&TriggerKind::CriticalMoment, now),
            Some(HintCategory::EmergencyGuidance)
        );
    }

    #[test]
    fn test_struggling_falls_back_to_contextual_tip() {
        let config = EngineConfig {
            initial_proficiency: ProficiencyLevel::Disabled,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with(config, 0.0);
        assert_eq!(
            engine.select_candidate(&TriggerKind::UserStruggling),
            HintCategory::ContextualTip
        );
        assert_eq!(
            engine.select_candidate(&TriggerKind::ManualRequest),
            HintCategory::SwipeGesture
        );
    }

    #[test]
    fn test_draw_above_probability_rejects() {
        let config = EngineConfig {
            initial_proficiency: ProficiencyLevel::Learning,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with(config.clone(), 0.61);
        assert_eq!(engine.evaluate(&TriggerKind::FirstTimeUser, Utc::now()), None);

        let (mut engine, _) = engine_with(config, 0.59);
        assert_eq!(
            engine.evaluate(&TriggerKind::FirstTimeUser, Utc::now()),
            Some(HintCategory::Onboarding)
        );
    }

    #[test]
    fn test_cooldown_blocks_then_releases() {
        let (mut engine, _) = engine_with(EngineConfig::default(), 0.0);
        let t0 = Utc::now();
        engine.record_shown(HintCategory::Onboarding, t0);

        let trigger = TriggerKind::FirstTimeUser;
        assert_eq!(engine.evaluate(&trigger, t0 + Duration::seconds(299)), None);
        assert_eq!(
            engine.evaluate(&trigger, t0 + Duration::seconds(300)),
            Some(HintCategory::Onboarding)
        );
    }

    #[test]
    fn test_not_enabled_rejects() {
        let config = EngineConfig {
            enabled_categories: [HintCategory::SwipeGesture].into_iter().collect(),
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with(config, 0.0);
        assert_eq!(engine.evaluate(&TriggerKind::FirstTimeUser, Utc::now()), None);
    }

    #[test]
    fn test_emergency_disabled_by_config() {
        let config = EngineConfig {
            emergency_guidance: false,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with(config, 0.0);
        assert_eq!(
            engine.evaluate(&TriggerKind::IntegrationFailure, Utc::now()),
            None
        );
    }

    #[test]
    fn test_every_mutation_persists() {
        let (mut engine, store) = engine_with(EngineConfig::default(), 0.0);
        let now = Utc::now();
        engine.record_shown(HintCategory::SwipeGesture, now);
        engine.record_outcome(HintOutcome::Accepted, now);
        engine.set_proficiency(ProficiencyLevel::Expert);
        engine.reset();
        assert_eq!(store.save_count(), 4);
        assert_eq!(store.snapshot(), Some(LearningState::new(ProficiencyLevel::New)));
    }

    #[test]
    fn test_failed_save_is_retried_on_next_mutation() {
        let (mut engine, store) = engine_with(EngineConfig::default(), 0.0);
        let now = Utc::now();

        store.set_fail_saves(true);
        engine.record_shown(HintCategory::SwipeGesture, now);
        assert!(engine.has_pending_save());
        assert!(store.snapshot().is_none());
        assert!(!engine.flush());

        store.set_fail_saves(false);
        engine.record_outcome(HintOutcome::Deferred, now);
        assert!(!engine.has_pending_save());
        let saved = store.snapshot().unwrap();
        assert_eq!(saved.history_len(HintCategory::SwipeGesture), 1);
        assert_eq!(saved.counters().transitions_deferred, 1);
    }

    #[test]
    fn test_adaptation_off_keeps_level() {
        let config = EngineConfig {
            adaptive_learning: false,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with(config, 0.0);
        for _ in 0..12 {
            engine.record_outcome(HintOutcome::Accepted, Utc::now());
        }
        assert_eq!(engine.proficiency(), ProficiencyLevel::New);
        assert_eq!(engine.state().counters().transitions_accepted, 12);
    }

    #[test]
    fn test_loads_persisted_state() {
        let store = InMemoryStore::with_state(LearningState::new(ProficiencyLevel::Intermediate));
        let engine = DecisionEngine::with_random(
            EngineConfig::default(),
            Box::new(store),
            Box::new(ScriptedRandom::constant(0.0)),
        );
        assert_eq!(engine.proficiency(), ProficiencyLevel::Intermediate);
    }
}

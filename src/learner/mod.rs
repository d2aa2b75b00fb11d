// src/learner/mod.rs - Learning state and proficiency adaptation

pub mod adaptation;
pub mod state;

pub use adaptation::{adapt, success_rate, HintOutcome};
pub use state::{InteractionCounters, LearningState, LearningStats, MAX_HISTORY_PER_CATEGORY};

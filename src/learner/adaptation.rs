// src/learner/adaptation.rs - Proficiency adaptation from accept/defer counts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::state::InteractionCounters;
use crate::hints::ProficiencyLevel;
use crate::infra::errors::HintError;

/// How the user responded to a displayed hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintOutcome {
    /// The user took the suggested transition.
    Accepted,
    /// The hint timed out or was dismissed.
    Deferred,
}

impl fmt::Display for HintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Deferred => f.write_str("deferred"),
        }
    }
}

impl FromStr for HintOutcome {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accepted" | "accept" => Ok(Self::Accepted),
            "deferred" | "defer" => Ok(Self::Deferred),
            _ => Err(HintError::UnknownOutcome {
                name: s.to_string(),
            }),
        }
    }
}

const EXPERT_MIN_ACCEPTED: u64 = 10;
const EXPERT_MIN_RATE: f64 = 0.8;
const INTERMEDIATE_MIN_ACCEPTED: u64 = 5;
const INTERMEDIATE_MIN_RATE: f64 = 0.6;
const LEARNING_MIN_ACCEPTED: u64 = 2;

/// accepted / (accepted + deferred), or 0 before any response.
pub fn success_rate(counters: &InteractionCounters) -> f64 {
    let total = counters.total();
    if total == 0 {
        return 0.0;
    }
    counters.transitions_accepted as f64 / total as f64
}

/// Recompute the proficiency level after a response.
///
/// The result is never below `current`, and `Disabled` stays `Disabled`.
pub fn adapt(current: ProficiencyLevel, counters: &InteractionCounters) -> ProficiencyLevel {
    if current == ProficiencyLevel::Disabled {
        return current;
    }

    let accepted = counters.transitions_accepted;
    let rate = success_rate(counters);

    let earned = if accepted >= EXPERT_MIN_ACCEPTED && rate > EXPERT_MIN_RATE {
        ProficiencyLevel::Expert
    } else if accepted >= INTERMEDIATE_MIN_ACCEPTED && rate > INTERMEDIATE_MIN_RATE {
        ProficiencyLevel::Intermediate
    } else if accepted >= LEARNING_MIN_ACCEPTED {
        ProficiencyLevel::Learning
    } else {
        return current;
    };

    current.max(earned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(accepted: u64, deferred: u64) -> InteractionCounters {
        InteractionCounters {
            transitions_accepted: accepted,
            transitions_deferred: deferred,
        }
    }

    #[test]
    fn test_success_rate_without_responses() {
        assert_eq!(success_rate(&counters(0, 0)), 0.0);
        assert!((success_rate(&counters(3, 1)) - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_thresholds() {
        use ProficiencyLevel::*;
        assert_eq!(adapt(New, &counters(1, 0)), New);
        assert_eq!(adapt(New, &counters(2, 0)), Learning);
        assert_eq!(adapt(New, &counters(5, 0)), Intermediate);
        assert_eq!(adapt(New, &counters(10, 0)), Expert);
        // 10 accepted but exactly 0.8 is not strictly above the bar
        assert_eq!(adapt(New, &counters(12, 3)), Intermediate);
        // 5 accepted at 0.5 falls through to Learning
        assert_eq!(adapt(New, &counters(5, 5)), Learning);
    }

    #[test]
    fn test_never_demotes() {
        use ProficiencyLevel::*;
        assert_eq!(adapt(Expert, &counters(2, 20)), Expert);
        assert_eq!(adapt(Intermediate, &counters(0, 4)), Intermediate);
    }

    #[test]
    fn test_disabled_is_terminal() {
        assert_eq!(
            adapt(ProficiencyLevel::Disabled, &counters(50, 0)),
            ProficiencyLevel::Disabled
        );
    }

    #[test]
    fn test_parse_outcome() {
        assert_eq!("accept".parse::<HintOutcome>().unwrap(), HintOutcome::Accepted);
        assert_eq!(
            "Deferred".parse::<HintOutcome>().unwrap(),
            HintOutcome::Deferred
        );
        assert!("maybe".parse::<HintOutcome>().is_err());
    }
}

// src/hints/policy.rs - Proficiency and frequency lookup tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::catalog::HintCategory;
use crate::infra::errors::HintError;

/// How comfortable the user is with the transition gesture.
///
/// `New < Learning < Intermediate < Expert`. `Disabled` is terminal and only
/// reachable through an explicit override.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    #[default]
    New,
    Learning,
    Intermediate,
    Expert,
    Disabled,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 5] = [
        ProficiencyLevel::New,
        ProficiencyLevel::Learning,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Expert,
        ProficiencyLevel::Disabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
            Self::Disabled => "disabled",
        }
    }

    pub fn frequency_class(&self) -> FrequencyClass {
        frequency_class(*self)
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ProficiencyLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == normalized)
            .ok_or_else(|| HintError::UnknownLevel {
                name: s.to_string(),
            })
    }
}

/// How often hints may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyClass {
    Never,
    Rare,
    Occasional,
    Regular,
    Frequent,
}

impl fmt::Display for FrequencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Never => "never",
            Self::Rare => "rare",
            Self::Occasional => "occasional",
            Self::Regular => "regular",
            Self::Frequent => "frequent",
        };
        f.write_str(name)
    }
}

/// Show-probability and per-category cooldown for a frequency class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyPolicy {
    /// Probability in `[0, 1]` that a non-critical candidate passes the draw.
    pub show_probability: f64,
    /// Minimum gap between two showings of the same category.
    /// `None` means the category never comes back once shown.
    pub cooldown: Option<Duration>,
}

impl FrequencyPolicy {
    /// True once `now` is at least one cooldown past `last_shown`.
    pub fn cooldown_elapsed(&self, last_shown: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let Some(cooldown) = self.cooldown else {
            return false;
        };
        let Ok(cooldown) = chrono::Duration::from_std(cooldown) else {
            return false;
        };
        now.signed_duration_since(last_shown) >= cooldown
    }
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

pub fn frequency_class(level: ProficiencyLevel) -> FrequencyClass {
    match level {
        ProficiencyLevel::New => FrequencyClass::Frequent,
        ProficiencyLevel::Learning => FrequencyClass::Regular,
        ProficiencyLevel::Intermediate => FrequencyClass::Occasional,
        ProficiencyLevel::Expert => FrequencyClass::Rare,
        ProficiencyLevel::Disabled => FrequencyClass::Never,
    }
}

pub fn policy(class: FrequencyClass) -> FrequencyPolicy {
    let (show_probability, cooldown) = match class {
        FrequencyClass::Never => (0.0, None),
        FrequencyClass::Rare => (0.1, Some(7 * DAY)),
        FrequencyClass::Occasional => (0.3, Some(DAY)),
        FrequencyClass::Regular => (0.6, Some(HOUR)),
        FrequencyClass::Frequent => (1.0, Some(5 * MINUTE)),
    };
    FrequencyPolicy {
        show_probability,
        cooldown: cooldown.map(Duration::from_secs),
    }
}

/// Categories worth showing at a level, most useful first.
pub fn preferred_categories(level: ProficiencyLevel) -> &'static [HintCategory] {
    use HintCategory::*;
    match level {
        ProficiencyLevel::New => &[Onboarding, SwipeGesture, TapTransition, ContextualTip],
        ProficiencyLevel::Learning => &[SwipeGesture, DragIndicator, ContextualTip],
        ProficiencyLevel::Intermediate => &[ContextualTip, DragIndicator],
        ProficiencyLevel::Expert => &[ContextualTip],
        ProficiencyLevel::Disabled => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(ProficiencyLevel::New < ProficiencyLevel::Learning);
        assert!(ProficiencyLevel::Learning < ProficiencyLevel::Intermediate);
        assert!(ProficiencyLevel::Intermediate < ProficiencyLevel::Expert);
    }

    #[test]
    fn test_new_users_see_hints_frequently() {
        let class = frequency_class(ProficiencyLevel::New);
        assert_eq!(class, FrequencyClass::Frequent);
        let p = policy(class);
        assert!((p.show_probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(p.cooldown, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_probability_shrinks_with_proficiency() {
        let probs: Vec<f64> = [
            ProficiencyLevel::New,
            ProficiencyLevel::Learning,
            ProficiencyLevel::Intermediate,
            ProficiencyLevel::Expert,
            ProficiencyLevel::Disabled,
        ]
        .iter()
        .map(|l| policy(l.frequency_class()).show_probability)
        .collect();
        assert!(probs.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(probs[4], 0.0);
    }

    #[test]
    fn test_cooldown_elapsed() {
        let p = policy(FrequencyClass::Regular);
        let t0 = Utc::now();
        assert!(!p.cooldown_elapsed(t0, t0 + chrono::Duration::minutes(59)));
        assert!(p.cooldown_elapsed(t0, t0 + chrono::Duration::minutes(60)));
    }

    #[test]
    fn test_never_cooldown_is_infinite() {
        let p = policy(FrequencyClass::Never);
        let t0 = Utc::now();
        assert!(!p.cooldown_elapsed(t0, t0 + chrono::Duration::days(3650)));
    }

    #[test]
    fn test_disabled_prefers_nothing() {
        assert!(preferred_categories(ProficiencyLevel::Disabled).is_empty());
        assert_eq!(
            preferred_categories(ProficiencyLevel::New)[0],
            HintCategory::Onboarding
        );
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(
            "Expert".parse::<ProficiencyLevel>().unwrap(),
            ProficiencyLevel::Expert
        );
        assert!("guru".parse::<ProficiencyLevel>().is_err());
    }
}

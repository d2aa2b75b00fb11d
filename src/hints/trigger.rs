// src/hints/trigger.rs - Trigger events that may warrant a hint

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::infra::errors::HintError;

/// Something the presentation layer observed during a call.
///
/// A trigger is transient: it is carried by one evaluation and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    FirstTimeUser,
    IntegrationFailure,
    /// The user has been on the call screen for this long.
    ExtendedUsage(Duration),
    UserStruggling,
    CriticalMoment,
    AccessibilityModeActive,
    ManualRequest,
    /// A presentation-side timer fired after this delay.
    TimerElapsed(Duration),
}

impl TriggerKind {
    /// Safety-critical triggers bypass probability and cooldown.
    pub fn is_safety_critical(&self) -> bool {
        matches!(self, Self::IntegrationFailure | Self::CriticalMoment)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstTimeUser => "first_time_user",
            Self::IntegrationFailure => "integration_failure",
            Self::ExtendedUsage(_) => "extended_usage",
            Self::UserStruggling => "user_struggling",
            Self::CriticalMoment => "critical_moment",
            Self::AccessibilityModeActive => "accessibility_mode_active",
            Self::ManualRequest => "manual_request",
            Self::TimerElapsed(_) => "timer_elapsed",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtendedUsage(d) | Self::TimerElapsed(d) => {
                write!(f, "{}:{}", self.name(), d.as_secs())
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Parses `name` or `name:seconds` (for the two duration-carrying kinds).
impl FromStr for TriggerKind {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || HintError::UnknownTrigger {
            name: s.to_string(),
        };
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let (name, arg) = match normalized.split_once(':') {
            Some((name, arg)) => (name.to_string(), Some(arg.to_string())),
            None => (normalized, None),
        };

        let seconds = || -> Result<Duration, HintError> {
            match arg.as_deref() {
                None => Ok(Duration::ZERO),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| unknown()),
            }
        };

        let trigger = match name.as_str() {
            "first_time_user" => Self::FirstTimeUser,
            "integration_failure" => Self::IntegrationFailure,
            "extended_usage" => Self::ExtendedUsage(seconds()?),
            "user_struggling" => Self::UserStruggling,
            "critical_moment" => Self::CriticalMoment,
            "accessibility_mode_active" | "accessibility" => Self::AccessibilityModeActive,
            "manual_request" | "manual" => Self::ManualRequest,
            "timer_elapsed" => Self::TimerElapsed(seconds()?),
            _ => return Err(unknown()),
        };

        if arg.is_some() && !matches!(trigger, Self::ExtendedUsage(_) | Self::TimerElapsed(_)) {
            return Err(unknown());
        }
        Ok(trigger)
    }
}

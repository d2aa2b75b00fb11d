// src/hints/catalog.rs - Static hint catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::infra::errors::HintError;

/// Every kind of guidance prompt the engine can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintCategory {
    SwipeGesture,
    TapTransition,
    DragIndicator,
    Onboarding,
    ContextualTip,
    EmergencyGuidance,
    AccessibilityAnnouncement,
    HapticPulse,
}

impl HintCategory {
    pub const ALL: [HintCategory; 8] = [
        HintCategory::SwipeGesture,
        HintCategory::TapTransition,
        HintCategory::DragIndicator,
        HintCategory::Onboarding,
        HintCategory::ContextualTip,
        HintCategory::EmergencyGuidance,
        HintCategory::AccessibilityAnnouncement,
        HintCategory::HapticPulse,
    ];

    /// Relative urgency. Higher is more urgent; only used as a selection hint.
    pub fn priority(&self) -> u8 {
        match self {
            Self::EmergencyGuidance => 10,
            Self::AccessibilityAnnouncement => 5,
            Self::Onboarding => 4,
            Self::SwipeGesture => 3,
            Self::TapTransition | Self::DragIndicator => 2,
            Self::ContextualTip | Self::HapticPulse => 1,
        }
    }

    /// How long the presentation layer keeps the hint on screen.
    pub fn default_duration(&self) -> Duration {
        let secs = match self {
            Self::SwipeGesture => 4,
            Self::TapTransition => 3,
            Self::DragIndicator => 4,
            Self::Onboarding => 8,
            Self::ContextualTip => 5,
            Self::EmergencyGuidance => 10,
            Self::AccessibilityAnnouncement => 6,
            Self::HapticPulse => 1,
        };
        Duration::from_secs(secs)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwipeGesture => "swipe_gesture",
            Self::TapTransition => "tap_transition",
            Self::DragIndicator => "drag_indicator",
            Self::Onboarding => "onboarding",
            Self::ContextualTip => "contextual_tip",
            Self::EmergencyGuidance => "emergency_guidance",
            Self::AccessibilityAnnouncement => "accessibility_announcement",
            Self::HapticPulse => "haptic_pulse",
        }
    }
}

/// Catalog lookup: on-screen duration for a category.
pub fn duration(category: HintCategory) -> Duration {
    category.default_duration()
}

impl fmt::Display for HintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HintCategory {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        HintCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| HintError::UnknownCategory {
                name: s.to_string(),
            })
    }
}

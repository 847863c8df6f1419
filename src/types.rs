//! Type-safe configuration types for the walkthrough engine
//!
//! This module replaces stringly-typed step/tutorial metadata with proper
//! Rust enums that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Where the overlay panel sits relative to its target element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StepPosition {
    #[strum(serialize = "top")]
    Top,
    #[strum(serialize = "bottom")]
    Bottom,
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "right")]
    Right,
    /// Centered in the viewport; the only valid position for targetless steps
    #[default]
    #[strum(serialize = "center")]
    Center,
}

/// Advisory hint for the interaction a step expects.
///
/// Consumed by callers for affordance rendering ("click here", cursor
/// shape); the engine itself never enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    #[strum(serialize = "click")]
    Click,
    #[strum(serialize = "hover")]
    Hover,
    #[strum(serialize = "scroll")]
    Scroll,
    #[strum(serialize = "type")]
    Type,
    #[strum(serialize = "wait")]
    Wait,
}

/// Tutorial difficulty rating (informational, used for display ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    #[strum(serialize = "beginner")]
    Beginner,
    #[strum(serialize = "intermediate")]
    Intermediate,
    #[strum(serialize = "advanced")]
    Advanced,
}

/// Policy for `skip()` on steps that are not marked optional.
///
/// `Always` records the skip and advances regardless of the `optional`
/// flag; `OptionalOnly` turns skip into a no-op on required steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Skip always advances and records the step id
    #[default]
    #[strum(serialize = "always")]
    Always,
    /// Skip is a no-op unless the current step is optional
    #[strum(serialize = "optional_only")]
    OptionalOnly,
}

/// Policy for overlay anchors computed near viewport edges.
///
/// The anchor formula is identical under both modes; `Clamp` pulls the
/// result back inside the viewport afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClampMode {
    /// Keep the overlay fully inside the viewport (hardened default)
    #[default]
    #[strum(serialize = "clamp")]
    Clamp,
    /// Allow partially off-screen overlays near viewport edges
    #[strum(serialize = "unclamped")]
    Unclamped,
}

impl StepPosition {
    /// Check if this position requires a resolved target to be meaningful
    pub fn needs_target(&self) -> bool {
        !matches!(self, Self::Center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_position_roundtrip() {
        for pos in [
            StepPosition::Top,
            StepPosition::Bottom,
            StepPosition::Left,
            StepPosition::Right,
            StepPosition::Center,
        ] {
            let s = pos.to_string();
            assert_eq!(StepPosition::from_str(&s).unwrap(), pos);
        }
    }

    #[test]
    fn test_position_default_is_center() {
        assert_eq!(StepPosition::default(), StepPosition::Center);
        assert!(!StepPosition::Center.needs_target());
        assert!(StepPosition::Top.needs_target());
    }

    #[test]
    fn test_action_parses_lowercase() {
        assert_eq!(StepAction::from_str("click").unwrap(), StepAction::Click);
        assert_eq!(StepAction::from_str("wait").unwrap(), StepAction::Wait);
        assert!(StepAction::from_str("Click").is_err());
    }

    #[test]
    fn test_difficulty_ordering() {
        assert!(Difficulty::Beginner < Difficulty::Intermediate);
        assert!(Difficulty::Intermediate < Difficulty::Advanced);
    }

    #[test]
    fn test_serde_spelling_matches_strum() {
        let json = serde_json::to_string(&StepPosition::Bottom).unwrap();
        assert_eq!(json, "\"bottom\"");
        let parsed: SkipPolicy = serde_json::from_str("\"optional_only\"").unwrap();
        assert_eq!(parsed, SkipPolicy::OptionalOnly);
    }
}

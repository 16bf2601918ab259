//! [`PostureIssue`] – one detected deviation from acceptable form.
//!
//! Issues travel to viewers as plain sentences, so `Display` is the wire
//! format and `Serialize` emits the same string. Angles are rendered to zero
//! decimal places.

use std::fmt;

use formwatch_types::{Activity, Side};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostureIssue {
    /// A required joint was missing or below the confidence gate.
    InsufficientKeypoints(Activity),
    /// Squat: the knee has travelled past the toes.
    KneeOverToe(Side),
    /// Squat: shoulder–hip–knee angle too closed on at least one side.
    HunchedBack { left: f64, right: f64 },
    /// Desk: ear–shoulder–hip angle too closed on at least one side.
    NeckBent { left: f64, right: f64 },
    /// Desk: torso leans away from vertical on at least one side.
    Slouching { left: f64, right: f64 },
    UnknownActivity,
}

impl fmt::Display for PostureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureIssue::InsufficientKeypoints(Activity::Squat) => {
                write!(f, "Insufficient keypoints detected for squat analysis.")
            }
            PostureIssue::InsufficientKeypoints(Activity::Desk) => {
                write!(f, "Insufficient keypoints detected for desk posture analysis.")
            }
            PostureIssue::KneeOverToe(side) => write!(f, "{side} knee over toe."),
            PostureIssue::HunchedBack { left, right } => {
                write!(f, "Hunched back detected (Back angle: {left:.0}° / {right:.0}°).")
            }
            PostureIssue::NeckBent { left, right } => write!(
                f,
                "Neck bent forward (>30° estimated) (Neck angle: {left:.0}° / {right:.0}°)."
            ),
            PostureIssue::Slouching { left, right } => {
                write!(f, "Slouching detected (Spine angle: {left:.0}° / {right:.0}°).")
            }
            PostureIssue::UnknownActivity => write!(f, "Unknown posture type."),
        }
    }
}

impl Serialize for PostureIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Render an evaluation result as the strings sent to viewers.
pub fn to_messages(issues: &[PostureIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knee_over_toe_renders_side() {
        assert_eq!(
            PostureIssue::KneeOverToe(Side::Left).to_string(),
            "Left knee over toe."
        );
        assert_eq!(
            PostureIssue::KneeOverToe(Side::Right).to_string(),
            "Right knee over toe."
        );
    }

    #[test]
    fn hunched_back_rounds_to_whole_degrees() {
        let issue = PostureIssue::HunchedBack {
            left: 132.2,
            right: 144.8,
        };
        assert_eq!(
            issue.to_string(),
            "Hunched back detected (Back angle: 132° / 145°)."
        );
    }

    #[test]
    fn desk_issues_embed_both_angles() {
        let neck = PostureIssue::NeckBent {
            left: 140.0,
            right: 171.4,
        };
        assert_eq!(
            neck.to_string(),
            "Neck bent forward (>30° estimated) (Neck angle: 140° / 171°)."
        );
        let spine = PostureIssue::Slouching {
            left: 152.6,
            right: 180.0,
        };
        assert_eq!(
            spine.to_string(),
            "Slouching detected (Spine angle: 153° / 180°)."
        );
    }

    #[test]
    fn insufficient_keypoints_wording_is_activity_specific() {
        let squat = PostureIssue::InsufficientKeypoints(Activity::Squat).to_string();
        let desk = PostureIssue::InsufficientKeypoints(Activity::Desk).to_string();
        assert!(squat.contains("squat"));
        assert!(desk.contains("desk"));
        assert_ne!(squat, desk);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![PostureIssue::UnknownActivity]).unwrap();
        assert_eq!(json, r#"["Unknown posture type."]"#);
    }

    #[test]
    fn to_messages_preserves_order() {
        let issues = [
            PostureIssue::KneeOverToe(Side::Right),
            PostureIssue::KneeOverToe(Side::Left),
        ];
        assert_eq!(
            to_messages(&issues),
            vec!["Right knee over toe.", "Left knee over toe."]
        );
    }
}

//! Calibration constants for the posture rules.
//!
//! The literals below are the calibrated defaults. They are grouped into
//! per-activity structs so that a deployment can tune them from its config
//! file without touching the rule code.

use serde::{Deserialize, Serialize};

/// Squat: every required joint must score strictly above this.
pub const SQUAT_MIN_CONFIDENCE: f64 = 0.2;
/// Squat: shoulder–hip–knee angle below this is a hunched back.
pub const SQUAT_MIN_BACK_ANGLE_DEG: f64 = 150.0;

/// Desk: every required joint must score strictly above this.
pub const DESK_MIN_CONFIDENCE: f64 = 0.5;
/// Desk: ear–shoulder–hip angle below this is a forward neck bend (>30°).
pub const DESK_MIN_NECK_ANGLE_DEG: f64 = 150.0;
/// Desk: shoulder–hip–vertical angle below this is slouching.
pub const DESK_MIN_SPINE_ANGLE_DEG: f64 = 160.0;
/// Desk: downward shift of the synthetic vertical reference below each hip,
/// in normalised image units.
pub const DESK_SPINE_REFERENCE_OFFSET: f64 = 0.1;

/// Tunable thresholds for [`SquatEvaluator`][crate::SquatEvaluator].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatThresholds {
    pub min_confidence: f64,
    pub min_back_angle_deg: f64,
}

impl Default for SquatThresholds {
    fn default() -> Self {
        Self {
            min_confidence: SQUAT_MIN_CONFIDENCE,
            min_back_angle_deg: SQUAT_MIN_BACK_ANGLE_DEG,
        }
    }
}

/// Tunable thresholds for [`DeskEvaluator`][crate::DeskEvaluator].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskThresholds {
    pub min_confidence: f64,
    pub min_neck_angle_deg: f64,
    pub min_spine_angle_deg: f64,
    pub spine_reference_offset: f64,
}

impl Default for DeskThresholds {
    fn default() -> Self {
        Self {
            min_confidence: DESK_MIN_CONFIDENCE,
            min_neck_angle_deg: DESK_MIN_NECK_ANGLE_DEG,
            min_spine_angle_deg: DESK_MIN_SPINE_ANGLE_DEG,
            spine_reference_offset: DESK_SPINE_REFERENCE_OFFSET,
        }
    }
}

/// Thresholds for every activity, as they appear in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureThresholds {
    pub squat: SquatThresholds,
    pub desk: DeskThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let t = PostureThresholds::default();
        assert_eq!(t.squat.min_confidence, 0.2);
        assert_eq!(t.squat.min_back_angle_deg, 150.0);
        assert_eq!(t.desk.min_confidence, 0.5);
        assert_eq!(t.desk.min_neck_angle_deg, 150.0);
        assert_eq!(t.desk.min_spine_angle_deg, 160.0);
        assert_eq!(t.desk.spine_reference_offset, 0.1);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let raw = "[desk]\nmin_spine_angle_deg = 155.0\n";
        let t: PostureThresholds = toml::from_str(raw).unwrap();
        assert_eq!(t.desk.min_spine_angle_deg, 155.0);
        assert_eq!(t.desk.min_neck_angle_deg, DESK_MIN_NECK_ANGLE_DEG);
        assert_eq!(t.squat, SquatThresholds::default());
    }
}

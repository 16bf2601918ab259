//! [`DeskEvaluator`] – desk-sitting posture from a front or side camera.
//!
//! Rules, evaluated in this order once the confidence gate passes:
//!
//! 1. Neck bend: ear–shoulder–hip angle per side. A side whose ear was not
//!    detected uses the nose instead. Below the threshold on either side
//!    means the head leans forward by more than ~30°.
//! 2. Spine straightness: shoulder–hip–reference angle per side, where the
//!    reference is a synthetic point straight below the hip. Below the
//!    threshold on either side is slouching.
//!
//! Ears are optional and never gated.

use formwatch_perception::{KeypointIndex, Point2, joint_angle, keypoints::position_of};
use formwatch_types::{Activity, Joint, Keypoint};

use crate::evaluator::PostureEvaluator;
use crate::issue::PostureIssue;
use crate::thresholds::DeskThresholds;

const REQUIRED: [Joint; 5] = [
    Joint::Nose,
    Joint::LeftShoulder,
    Joint::RightShoulder,
    Joint::LeftHip,
    Joint::RightHip,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DeskEvaluator {
    thresholds: DeskThresholds,
}

impl DeskEvaluator {
    pub fn new(thresholds: DeskThresholds) -> Self {
        Self { thresholds }
    }

    fn spine_angle(&self, shoulder: Option<Point2>, hip: Option<Point2>) -> f64 {
        let reference = hip.map(|h| h.offset(0.0, self.thresholds.spine_reference_offset));
        joint_angle(shoulder, hip, reference)
    }
}

impl PostureEvaluator for DeskEvaluator {
    fn activity(&self) -> Activity {
        Activity::Desk
    }

    fn evaluate(&self, keypoints: &[Keypoint]) -> Vec<PostureIssue> {
        let index = KeypointIndex::new(keypoints);
        let Some([nose, l_shoulder, r_shoulder, l_hip, r_hip]) =
            index.require(REQUIRED, self.thresholds.min_confidence)
        else {
            return vec![PostureIssue::InsufficientKeypoints(Activity::Desk)];
        };

        let l_shoulder = position_of(l_shoulder);
        let r_shoulder = position_of(r_shoulder);
        let l_hip = position_of(l_hip);
        let r_hip = position_of(r_hip);

        let mut issues = Vec::new();

        let l_head = index.find(Joint::LeftEar).unwrap_or(nose);
        let r_head = index.find(Joint::RightEar).unwrap_or(nose);
        let left = joint_angle(position_of(l_head), l_shoulder, l_hip);
        let right = joint_angle(position_of(r_head), r_shoulder, r_hip);
        let min = self.thresholds.min_neck_angle_deg;
        if left < min || right < min {
            issues.push(PostureIssue::NeckBent { left, right });
        }

        let left = self.spine_angle(l_shoulder, l_hip);
        let right = self.spine_angle(r_shoulder, r_hip);
        let min = self.thresholds.min_spine_angle_deg;
        if left < min || right < min {
            issues.push(PostureIssue::Slouching { left, right });
        }

        issues
    }
}

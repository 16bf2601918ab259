//! [`SquatEvaluator`] – barbell squat form from a side-on camera.
//!
//! Rules, evaluated in this order once the confidence gate passes:
//!
//! 1. Left knee over toe: `left_knee.x < left_ankle.x`.
//! 2. Right knee over toe: `right_knee.x > right_ankle.x`.
//! 3. Hunched back: shoulder–hip–knee angle below the threshold on either
//!    side.
//!
//! Rules 1 and 2 compare in opposite directions. They encode the camera
//! facing assumed at calibration time and are not mirror-symmetric.

use formwatch_perception::{KeypointIndex, joint_angle, keypoints::position_of};
use formwatch_types::{Activity, Joint, Keypoint, Side};

use crate::evaluator::PostureEvaluator;
use crate::issue::PostureIssue;
use crate::thresholds::SquatThresholds;

const REQUIRED: [Joint; 8] = [
    Joint::LeftShoulder,
    Joint::RightShoulder,
    Joint::LeftHip,
    Joint::RightHip,
    Joint::LeftKnee,
    Joint::RightKnee,
    Joint::LeftAnkle,
    Joint::RightAnkle,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SquatEvaluator {
    thresholds: SquatThresholds,
}

impl SquatEvaluator {
    pub fn new(thresholds: SquatThresholds) -> Self {
        Self { thresholds }
    }
}

impl PostureEvaluator for SquatEvaluator {
    fn activity(&self) -> Activity {
        Activity::Squat
    }

    fn evaluate(&self, keypoints: &[Keypoint]) -> Vec<PostureIssue> {
        let index = KeypointIndex::new(keypoints);
        let Some([l_shoulder, r_shoulder, l_hip, r_hip, l_knee, r_knee, l_ankle, r_ankle]) =
            index.require(REQUIRED, self.thresholds.min_confidence)
        else {
            return vec![PostureIssue::InsufficientKeypoints(Activity::Squat)];
        };

        let mut issues = Vec::new();

        if let (Some(knee), Some(ankle)) = (l_knee.x, l_ankle.x)
            && knee < ankle
        {
            issues.push(PostureIssue::KneeOverToe(Side::Left));
        }
        if let (Some(knee), Some(ankle)) = (r_knee.x, r_ankle.x)
            && knee > ankle
        {
            issues.push(PostureIssue::KneeOverToe(Side::Right));
        }

        let left = joint_angle(
            position_of(l_shoulder),
            position_of(l_hip),
            position_of(l_knee),
        );
        let right = joint_angle(
            position_of(r_shoulder),
            position_of(r_hip),
            position_of(r_knee),
        );
        let min = self.thresholds.min_back_angle_deg;
        if left < min || right < min {
            issues.push(PostureIssue::HunchedBack { left, right });
        }

        issues
    }
}

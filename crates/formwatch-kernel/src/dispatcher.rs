//! [`Dispatcher`] – the single entry point the transport calls per frame.
//!
//! Resolves the activity tag to one of the closed set of evaluators and
//! normalises unknown tags into a [`PostureIssue::UnknownActivity`] result.
//!
//! # Example
//!
//! ```
//! use formwatch_kernel::{Dispatcher, issue::to_messages};
//!
//! let dispatcher = Dispatcher::default();
//! let issues = dispatcher.evaluate(&[], "yoga");
//! assert_eq!(to_messages(&issues), vec!["Unknown posture type."]);
//! ```

use formwatch_types::{Activity, Keypoint};
use tracing::debug;

use crate::desk::DeskEvaluator;
use crate::evaluator::PostureEvaluator;
use crate::issue::PostureIssue;
use crate::squat::SquatEvaluator;
use crate::thresholds::PostureThresholds;

/// Holds one evaluator per [`Activity`]. Cheap to copy and safe to share;
/// evaluation takes `&self` and touches no mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    squat: SquatEvaluator,
    desk: DeskEvaluator,
}

impl Dispatcher {
    /// Build a dispatcher with calibrated default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dispatcher from configured thresholds.
    pub fn with_thresholds(thresholds: PostureThresholds) -> Self {
        Self {
            squat: SquatEvaluator::new(thresholds.squat),
            desk: DeskEvaluator::new(thresholds.desk),
        }
    }

    /// The evaluator responsible for `activity`.
    pub fn evaluator(&self, activity: Activity) -> &dyn PostureEvaluator {
        match activity {
            Activity::Squat => &self.squat,
            Activity::Desk => &self.desk,
        }
    }

    /// Evaluate `keypoints` under the raw activity `tag`.
    ///
    /// Unknown tags yield exactly `[UnknownActivity]` without any geometry.
    pub fn evaluate(&self, keypoints: &[Keypoint], tag: &str) -> Vec<PostureIssue> {
        match tag.parse::<Activity>() {
            Ok(activity) => self.evaluate_activity(keypoints, activity),
            Err(_) => {
                debug!(tag, "unknown activity tag");
                vec![PostureIssue::UnknownActivity]
            }
        }
    }

    /// Evaluate `keypoints` under an already-parsed activity.
    pub fn evaluate_activity(&self, keypoints: &[Keypoint], activity: Activity) -> Vec<PostureIssue> {
        let issues = self.evaluator(activity).evaluate(keypoints);
        debug!(%activity, keypoints = keypoints.len(), issues = issues.len(), "frame evaluated");
        issues
    }
}

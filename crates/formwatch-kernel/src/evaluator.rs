//! [`PostureEvaluator`] – the capability shared by every activity rule set.

use formwatch_types::{Activity, Keypoint};

use crate::issue::PostureIssue;

/// A per-activity rule set.
///
/// Implementations are stateless: the same keypoints always produce the same
/// issues, in the same order, and the input slice is never modified. That
/// makes an evaluator safe to share across threads and sessions.
pub trait PostureEvaluator: Send + Sync {
    /// The activity this rule set judges.
    fn activity(&self) -> Activity;

    /// Evaluate one frame.
    ///
    /// Returns an empty vector when posture is acceptable. Missing or
    /// low-confidence required joints produce exactly one
    /// [`PostureIssue::InsufficientKeypoints`] and nothing else.
    fn evaluate(&self, keypoints: &[Keypoint]) -> Vec<PostureIssue>;
}

//! Keypoint Index.
//!
//! Name-based lookup over an unordered keypoint set. Detectors promise one
//! entry per joint name but nothing here relies on it: when duplicates
//! occur the first match in iteration order wins.

use formwatch_types::{Joint, Keypoint};
use tracing::trace;

use crate::geometry::Point2;

/// First keypoint in `set` whose name equals `name`, or `None`.
pub fn find<'a>(set: &'a [Keypoint], name: &str) -> Option<&'a Keypoint> {
    set.iter().find(|kp| kp.name == name)
}

/// The position of a keypoint, when both coordinates are present and finite.
pub fn position_of(kp: &Keypoint) -> Option<Point2> {
    kp.coords().map(|(x, y)| Point2::new(x, y))
}

/// Read-only view over one frame's keypoints.
///
/// Borrowing the slice keeps the frame immutable for the lifetime of the
/// index.
#[derive(Debug, Clone, Copy)]
pub struct KeypointIndex<'a> {
    keypoints: &'a [Keypoint],
}

impl<'a> KeypointIndex<'a> {
    pub fn new(keypoints: &'a [Keypoint]) -> Self {
        Self { keypoints }
    }

    /// Look up a joint from the fixed vocabulary.
    pub fn find(&self, joint: Joint) -> Option<&'a Keypoint> {
        find(self.keypoints, joint.as_str())
    }

    /// Look up an arbitrary detector name.
    pub fn find_named(&self, name: &str) -> Option<&'a Keypoint> {
        find(self.keypoints, name)
    }

    /// Position of `joint`, ignoring its confidence.
    pub fn position(&self, joint: Joint) -> Option<Point2> {
        self.find(joint).and_then(position_of)
    }

    /// Return every requested joint, in request order, only if each one is
    /// present with a score strictly above `min_score`.
    ///
    /// A score equal to the threshold fails the gate, as does a NaN score.
    pub fn require<const N: usize>(
        &self,
        joints: [Joint; N],
        min_score: f64,
    ) -> Option<[&'a Keypoint; N]> {
        let found = joints
            .iter()
            .map(|&joint| match self.find(joint) {
                Some(kp) if kp.score > min_score => Some(kp),
                Some(kp) => {
                    trace!(joint = %joint, score = kp.score, min_score, "keypoint below confidence gate");
                    None
                }
                None => {
                    trace!(joint = %joint, "keypoint missing");
                    None
                }
            })
            .collect::<Option<Vec<_>>>()?;
        found.try_into().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Vec<Keypoint> {
        vec![
            Keypoint::new("nose", 0.5, 0.1, 0.9),
            Keypoint::new("left_shoulder", 0.4, 0.3, 0.8),
            Keypoint::new("right_shoulder", 0.6, 0.3, 0.5),
        ]
    }

    #[test]
    fn find_returns_matching_keypoint() {
        let set = frame();
        let kp = find(&set, "left_shoulder").expect("present");
        assert_eq!(kp.x, Some(0.4));
    }

    #[test]
    fn find_absent_returns_none() {
        let set = frame();
        assert!(find(&set, "left_ankle").is_none());
        assert!(find(&[], "nose").is_none());
    }

    #[test]
    fn find_prefers_first_duplicate() {
        let set = vec![
            Keypoint::new("nose", 0.1, 0.1, 0.9),
            Keypoint::new("nose", 0.9, 0.9, 0.9),
        ];
        assert_eq!(find(&set, "nose").map(|kp| kp.x), Some(Some(0.1)));
    }

    #[test]
    fn find_does_not_depend_on_ordering() {
        let mut set = frame();
        set.reverse();
        let kp = KeypointIndex::new(&set).find(Joint::Nose).expect("present");
        assert_eq!(kp.y, Some(0.1));
    }

    #[test]
    fn require_returns_joints_in_request_order() {
        let set = frame();
        let index = KeypointIndex::new(&set);
        let [nose, left] = index
            .require([Joint::Nose, Joint::LeftShoulder], 0.5)
            .expect("gate passes");
        assert_eq!(nose.name, "nose");
        assert_eq!(left.name, "left_shoulder");
    }

    #[test]
    fn require_rejects_score_at_threshold() {
        let set = frame();
        let index = KeypointIndex::new(&set);
        assert!(index.require([Joint::RightShoulder], 0.5).is_none());
        assert!(index.require([Joint::RightShoulder], 0.49).is_some());
    }

    #[test]
    fn require_rejects_missing_joint() {
        let set = frame();
        let index = KeypointIndex::new(&set);
        assert!(index.require([Joint::Nose, Joint::LeftHip], 0.1).is_none());
    }

    #[test]
    fn require_rejects_nan_score() {
        let set = vec![Keypoint::new("nose", 0.5, 0.5, f64::NAN)];
        assert!(KeypointIndex::new(&set).require([Joint::Nose], 0.0).is_none());
    }

    #[test]
    fn position_requires_both_coordinates() {
        let set = vec![Keypoint {
            name: "nose".to_string(),
            x: Some(0.5),
            y: None,
            score: 1.0,
        }];
        let index = KeypointIndex::new(&set);
        assert!(index.position(Joint::Nose).is_none());
        assert!(index.find(Joint::Nose).is_some());
    }

    #[test]
    fn find_named_accepts_unknown_vocabulary() {
        let set = vec![Keypoint::new("left_big_toe", 0.2, 0.9, 0.7)];
        let index = KeypointIndex::new(&set);
        assert!(index.find_named("left_big_toe").is_some());
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identity of one relay connection. Feedback is routed back by this id.
pub type SessionId = Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Skeleton vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// The 17-joint COCO vocabulary emitted by MoveNet / PoseNet style detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// Every joint, in detector output order.
    pub const ALL: [Joint; 17] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Wire name of the joint (e.g. `"left_knee"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Joint {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .into_iter()
            .find(|j| j.as_str() == s)
            .ok_or_else(|| FormError::Protocol(format!("unknown joint name: {s}")))
    }
}

/// Body side, as seen by the detector (not mirrored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "Left"),
            Side::Right => write!(f, "Right"),
        }
    }
}

/// One detected joint observation.
///
/// Coordinates are normalised to `[0, 1]` of the source frame. Either
/// coordinate may be missing on the wire; `score` defaults to `0.0`, which
/// fails every confidence gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Keypoint {
    /// Joint name from the detector vocabulary (see [`Joint`]).
    pub name: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// Detector confidence in `[0, 1]`.
    #[serde(default)]
    pub score: f64,
}

impl Keypoint {
    /// Create a fully populated keypoint.
    pub fn new(name: impl Into<String>, x: f64, y: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            x: Some(x),
            y: Some(y),
            score,
        }
    }

    /// Both coordinates, when present and finite.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Activities
// ────────────────────────────────────────────────────────────────────────────

/// The closed set of activities the posture engine knows how to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Barbell squat, side-on camera.
    Squat,
    /// Desk sitting, front or side camera.
    Desk,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Activity::Squat => "squat",
            Activity::Desk => "desk",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = FormError;

    /// Tags are matched exactly (case-sensitive, no trimming).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squat" => Ok(Activity::Squat),
            "desk" => Ok(Activity::Desk),
            other => Err(FormError::Protocol(format!("unknown activity tag: {other}"))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Event bus payloads
// ────────────────────────────────────────────────────────────────────────────

/// A frame submitted by a relay session for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRequest {
    pub session_id: SessionId,
    /// Client-chosen sequence number, echoed back in the feedback.
    pub frame_id: u64,
    /// Raw activity tag; unknown tags are resolved by the dispatcher.
    pub activity: String,
    pub keypoints: Vec<Keypoint>,
}

/// Evaluation outcome for one [`FrameRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub session_id: SessionId,
    pub frame_id: u64,
    pub activity: String,
    /// Ordered, human-readable posture issues. Empty means acceptable form.
    pub issues: Vec<String>,
    /// The original keypoints, forwarded for client-side overlay drawing.
    pub keypoints: Vec<Keypoint>,
}

/// Unified event wrapper for the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "formwatch-relay::session"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp a payload with a fresh id and the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that can be routed over the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    FrameSubmitted(FrameRequest),
    SessionOpened { session_id: SessionId },
    SessionClosed { session_id: SessionId },
}

// ────────────────────────────────────────────────────────────────────────────
// Relay wire protocol
// ────────────────────────────────────────────────────────────────────────────

/// Messages a viewer sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One frame of keypoints to evaluate under `activity`.
    Frame {
        #[serde(default)]
        frame_id: u64,
        activity: String,
        keypoints: Vec<Keypoint>,
    },
}

/// Messages the relay sends back to a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection.
    Welcome { session_id: SessionId },
    Feedback {
        frame_id: u64,
        activity: String,
        issues: Vec<String>,
        keypoints: Vec<Keypoint>,
    },
    Error { message: String },
}

impl From<Feedback> for ServerMessage {
    fn from(fb: Feedback) -> Self {
        ServerMessage::Feedback {
            frame_id: fb.frame_id,
            activity: fb.activity,
            issues: fb.issues,
            keypoints: fb.keypoints,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised by the plumbing around the posture engine. The engine
/// itself never fails; every failure mode there is a posture issue.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum FormError {
    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Protocol Error: {0}")]
    Protocol(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Config Error: {0}")]
    Config(String),
}

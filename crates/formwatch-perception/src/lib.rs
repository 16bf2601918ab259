//! `formwatch-perception` – skeletal geometry primitives.
//!
//! Turns a raw keypoint set into the two quantities the posture rules reason
//! about: "is this joint trustworthy?" and "what angle does this limb make?".
//!
//! # Modules
//!
//! - [`keypoints`] – [`KeypointIndex`][keypoints::KeypointIndex]: name lookup
//!   and confidence-gated selection over one frame's keypoints.
//! - [`geometry`] – [`joint_angle`][geometry::joint_angle]: planar angle at a
//!   vertex joint, with a `0°` policy for degenerate input.

pub mod geometry;
pub mod keypoints;

pub use geometry::{Point2, joint_angle};
pub use keypoints::{KeypointIndex, find};

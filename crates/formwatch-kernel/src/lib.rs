//! `formwatch-kernel` – the posture rule engine.
//!
//! Stateless, per-frame classification of skeletal keypoints into posture
//! issues. Nothing in this crate blocks, allocates shared state or fails:
//! every failure mode is expressed as a [`PostureIssue`].
//!
//! # Modules
//!
//! - [`evaluator`] – the [`PostureEvaluator`] capability shared by every
//!   activity.
//! - [`squat`] – [`SquatEvaluator`]: knee-over-toe and hunched-back rules.
//! - [`desk`] – [`DeskEvaluator`]: neck-bend and spine-straightness rules.
//! - [`dispatcher`] – [`Dispatcher`]: resolves an activity tag to its
//!   evaluator; the only entry point the transport needs.
//! - [`issue`] – [`PostureIssue`] and its wire rendering.
//! - [`thresholds`] – calibrated constants and their tunable config structs.

pub mod desk;
pub mod dispatcher;
pub mod evaluator;
pub mod issue;
pub mod squat;
pub mod thresholds;

pub use desk::DeskEvaluator;
pub use dispatcher::Dispatcher;
pub use evaluator::PostureEvaluator;
pub use issue::PostureIssue;
pub use squat::SquatEvaluator;
pub use thresholds::{DeskThresholds, PostureThresholds, SquatThresholds};

//! `formwatch-middleware` – frame and feedback routing.
//!
//! Moves keypoint frames from relay sessions to the evaluation worker and
//! evaluation results back, without caring what the data means.
//!
//! # Modules
//!
//! - [`bus`] – topic-based publish/subscribe on Tokio broadcast channels,
//!   plus one bounded feedback queue per session.

pub mod bus;

pub use bus::{DEFAULT_CAPACITY, EventBus, SessionFeedback, Topic, TopicReceiver};

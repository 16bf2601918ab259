//! [`EvaluationWorker`] – runs the posture engine for every submitted frame.
//!
//! Consumes [`Topic::Frames`], evaluates each `FrameSubmitted` payload with
//! the [`Dispatcher`] and delivers the result into the originating session's
//! feedback queue via [`EventBus::deliver_feedback`].
//!
//! The worker subscribes in [`EvaluationWorker::new`], so frames published
//! after construction are never missed even if [`run`][EvaluationWorker::run]
//! starts later.
//!
//! # Backpressure
//!
//! The frames channel is bounded. When the worker falls behind, the oldest
//! frames are dropped by the channel and the worker logs how many it lost,
//! then carries on with the newest ones. Finished feedback is never dropped
//! on behalf of another session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use formwatch_kernel::{Dispatcher, issue::to_messages};
use formwatch_middleware::{EventBus, Topic, TopicReceiver};
use formwatch_types::{Event, EventPayload, Feedback, FrameRequest};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

/// Live counters of a running [`EvaluationWorker`]. Cheap to clone; every
/// clone observes the same worker.
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    evaluated: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    undelivered: Arc<AtomicU64>,
}

impl WorkerStats {
    /// Frames evaluated so far.
    pub fn evaluated(&self) -> u64 {
        self.evaluated.load(Ordering::Relaxed)
    }

    /// Frames lost to channel lag before evaluation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Evaluated frames whose session was gone or not reading.
    pub fn undelivered(&self) -> u64 {
        self.undelivered.load(Ordering::Relaxed)
    }
}

pub struct EvaluationWorker {
    bus: EventBus,
    dispatcher: Dispatcher,
    frames: TopicReceiver,
    stats: WorkerStats,
}

impl EvaluationWorker {
    /// Create a worker and subscribe it to [`Topic::Frames`] immediately.
    pub fn new(bus: EventBus, dispatcher: Dispatcher) -> Self {
        let frames = bus.subscribe_to(Topic::Frames);
        Self {
            bus,
            dispatcher,
            frames,
            stats: WorkerStats::default(),
        }
    }

    /// A handle to this worker's counters that stays valid after `run`.
    pub fn stats(&self) -> WorkerStats {
        self.stats.clone()
    }

    /// Evaluate one frame. Pure; does not touch the bus.
    #[instrument(skip(self, request), fields(session = %request.session_id, frame = request.frame_id))]
    pub fn evaluate_frame(&self, request: FrameRequest) -> Feedback {
        let issues = self.dispatcher.evaluate(&request.keypoints, &request.activity);
        Feedback {
            session_id: request.session_id,
            frame_id: request.frame_id,
            activity: request.activity,
            issues: to_messages(&issues),
            keypoints: request.keypoints,
        }
    }

    /// Process frames until the bus closes.
    pub async fn run(mut self) {
        info!("evaluation worker started");
        loop {
            match self.frames.recv().await {
                Ok(event) => self.handle_event(event),
                Err(RecvError::Lagged(n)) => {
                    let total = self.stats.dropped.fetch_add(n, Ordering::Relaxed) + n;
                    warn!(dropped_frames = n, total_dropped = total, "evaluation worker lagging; frames dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!(
            evaluated = self.stats.evaluated(),
            dropped = self.stats.dropped(),
            undelivered = self.stats.undelivered(),
            "evaluation worker stopped"
        );
    }

    fn handle_event(&self, event: Event) {
        let EventPayload::FrameSubmitted(request) = event.payload else {
            return;
        };
        let feedback = self.evaluate_frame(request);
        self.stats.evaluated.fetch_add(1, Ordering::Relaxed);

        let session = feedback.session_id;
        // The session may have disconnected while its frame was in flight.
        if let Err(e) = self.bus.deliver_feedback(feedback) {
            self.stats.undelivered.fetch_add(1, Ordering::Relaxed);
            debug!(%session, error = %e, "feedback discarded");
        }
    }
}

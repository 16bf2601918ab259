//! Frame and feedback routing between relay sessions and the evaluation
//! worker.
//!
//! Frames and session lifecycle notices travel on one
//! [`tokio::sync::broadcast`] channel per [`Topic`]; a slow subscriber never
//! blocks publishers or other subscribers. Each topic channel is bounded: a
//! subscriber that falls more than `capacity` events behind loses the oldest
//! ones and is told how many it missed. That is the frame-drop policy for
//! evaluation backpressure.
//!
//! Feedback does not share a channel. Each session registers its own bounded
//! queue with [`EventBus::session_feedback`] and the worker delivers into it
//! with [`EventBus::deliver_feedback`], so a busy session can never evict
//! another session's results.
//!
//! # Topics
//!
//! | Topic | Carries |
//! |---|---|
//! | [`Topic::Frames`] | `FrameSubmitted` from relay sessions to the evaluation worker |
//! | [`Topic::Sessions`] | `SessionOpened` / `SessionClosed` lifecycle notices |

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use formwatch_types::{Event, Feedback, FormError, SessionId};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Events buffered per topic (and feedback per session) before overflow.
pub const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Keypoint frames awaiting evaluation.
    Frames,
    /// Session lifecycle notices.
    Sessions,
}

type FeedbackRoutes = Arc<RwLock<HashMap<SessionId, mpsc::Sender<Feedback>>>>;

/// Handle to the topic channels and the per-session feedback queues. Clones
/// share the same channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    frames: broadcast::Sender<Event>,
    sessions: broadcast::Sender<Event>,
    routes: FeedbackRoutes,
    capacity: usize,
}

impl EventBus {
    /// Bus whose topic channels and feedback queues each buffer `capacity`
    /// items.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (frames, _) = broadcast::channel(capacity);
        let (sessions, _) = broadcast::channel(capacity);
        Self {
            frames,
            sessions,
            routes: Arc::default(),
            capacity,
        }
    }

    /// Send `event` on `topic`, returning how many receivers got it.
    ///
    /// Fails with [`FormError::Channel`] when the topic has no subscribers.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, FormError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| FormError::Channel(format!("No subscribers for topic {topic:?}")))
    }

    /// Subscribe to every future event on `topic`.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Register a feedback queue for `session_id`.
    ///
    /// The queue is unregistered when the returned receiver is dropped.
    /// Registering the same id twice replaces the earlier queue.
    pub fn session_feedback(&self, session_id: SessionId) -> SessionFeedback {
        let (tx, receiver) = mpsc::channel(self.capacity);
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, tx);
        debug!(session = %session_id, "feedback queue registered");
        SessionFeedback {
            session_id,
            receiver,
            routes: Arc::clone(&self.routes),
        }
    }

    /// Hand `feedback` to the session it is addressed to without waiting.
    ///
    /// Fails with [`FormError::Channel`] when the session is gone or its
    /// queue is full; other sessions are never affected.
    pub fn deliver_feedback(&self, feedback: Feedback) -> Result<(), FormError> {
        let session = feedback.session_id;
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        let tx = routes
            .get(&session)
            .ok_or_else(|| FormError::Channel(format!("no session {session}")))?;
        tx.try_send(feedback).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                FormError::Channel(format!("feedback queue full for session {session}"))
            }
            mpsc::error::TrySendError::Closed(_) => {
                FormError::Channel(format!("session {session} closed"))
            }
        })
    }

    /// Number of sessions with a registered feedback queue.
    pub fn session_count(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of receivers currently listening on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topic_sender(topic).receiver_count()
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Frames => &self.frames,
            Topic::Sessions => &self.sessions,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Raw subscription to one [`Topic`], from [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Next event on this topic. `Lagged(n)` reports `n` events lost to
    /// overflow; `Closed` means every sender is gone.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

// ---------------------------------------------------------------------------
// Per-session feedback queue
// ---------------------------------------------------------------------------

/// Receiving end of one session's feedback queue.
pub struct SessionFeedback {
    session_id: SessionId,
    receiver: mpsc::Receiver<Feedback>,
    routes: FeedbackRoutes,
}

impl SessionFeedback {
    /// Wait for the next feedback addressed to this session.
    ///
    /// Returns `None` if a later registration for the same session replaced
    /// this queue.
    pub async fn recv(&mut self) -> Option<Feedback> {
        self.receiver.recv().await
    }
}

impl Drop for SessionFeedback {
    fn drop(&mut self) {
        // Closing first lets us tell our own route apart from a replacement.
        self.receiver.close();
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if routes.get(&self.session_id).is_some_and(|tx| tx.is_closed()) {
            routes.remove(&self.session_id);
            debug!(session = %self.session_id, "feedback queue unregistered");
        }
    }
}

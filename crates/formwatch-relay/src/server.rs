//! [`RelayServer`] – WebSocket relay between viewers and the posture engine.
//!
//! Listens on `0.0.0.0:8765` (configurable via [`RelayServer::with_port`]).
//!
//! * WebSocket upgrades → one session per connection. Inbound `frame`
//!   messages are published on [`Topic::Frames`]; the session's own feedback
//!   queue is drained back to the viewer as results arrive. Opening and
//!   closing are announced on [`Topic::Sessions`].
//! * Regular HTTP requests → 200 OK with a small JSON health document.

use std::net::SocketAddr;

use formwatch_middleware::{EventBus, Topic};
use formwatch_types::{
    ClientMessage, Event, EventPayload, FormError, FrameRequest, ServerMessage, SessionId,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default TCP port for the relay.
pub const DEFAULT_PORT: u16 = 8765;

/// Body served to plain HTTP requests.
const HEALTH_BODY: &str = r#"{"service":"formwatch-relay","status":"ok"}"#;

const SOURCE: &str = "formwatch-relay::session";

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

// ---------------------------------------------------------------------------
// RelayServer
// ---------------------------------------------------------------------------

/// WebSocket relay that turns viewer connections into bus sessions.
///
/// An `EvaluationWorker` (from `formwatch-runtime`) must be attached to the
/// same bus, otherwise every frame is answered with an `error` message.
///
/// # Example
///
/// ```rust,no_run
/// use formwatch_middleware::EventBus;
/// use formwatch_relay::RelayServer;
///
/// #[tokio::main]
/// async fn main() {
///     let bus = EventBus::default();
///     RelayServer::new(bus)
///         .run()
///         .await
///         .expect("relay server failed");
/// }
/// ```
pub struct RelayServer {
    bus: EventBus,
    port: u16,
}

impl RelayServer {
    /// Relay for `bus`, listening on [`DEFAULT_PORT`] unless overridden.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            port: DEFAULT_PORT,
        }
    }

    /// Listen on `port` instead.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The port `run` will bind.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Bind `0.0.0.0:<port>` and serve forever.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Transport`] if the TCP listener cannot bind.
    pub async fn run(self) -> Result<(), FormError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| FormError::Transport(format!("bind error on {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), FormError> {
        let local = listener
            .local_addr()
            .map_err(|e| FormError::Transport(format!("listener address: {e}")))?;
        info!(%local, "relay listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let bus = self.bus.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, bus).await {
                            warn!(%peer, error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept error");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    bus: EventBus,
) -> Result<(), FormError> {
    // `peek` leaves the request in the socket for tungstenite's handshake.
    let mut buf = [0u8; 1024];
    let n = stream
        .peek(&mut buf)
        .await
        .map_err(|e| FormError::Transport(format!("peek error from {peer}: {e}")))?;

    let header_preview = String::from_utf8_lossy(&buf[..n]);
    let is_ws_upgrade = header_preview.lines().any(|line| {
        let line = line.to_lowercase();
        line.starts_with("upgrade:") && line.contains("websocket")
    });

    if is_ws_upgrade {
        handle_ws(stream, peer, bus).await
    } else {
        serve_health(stream).await
    }
}

async fn serve_health(mut stream: TcpStream) -> Result<(), FormError> {
    // Consume the peeked request; closing with unread input resets the peer.
    let mut request = [0u8; 1024];
    let _ = stream.read(&mut request).await;

    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        HEALTH_BODY.len(),
        HEALTH_BODY
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| FormError::Transport(format!("HTTP write error: {e}")))?;
    let _ = stream.shutdown().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// WebSocket session
// ---------------------------------------------------------------------------

async fn handle_ws(stream: TcpStream, peer: SocketAddr, bus: EventBus) -> Result<(), FormError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| FormError::Transport(format!("WS handshake from {peer}: {e}")))?;

    let session_id = Uuid::new_v4();
    // Subscribe before the client can submit anything.
    let mut feedback = bus.session_feedback(session_id);
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    send_message(&mut ws_tx, &ServerMessage::Welcome { session_id }).await?;
    announce(&bus, EventPayload::SessionOpened { session_id });
    info!(%peer, session = %session_id, "session opened");

    loop {
        tokio::select! {
            // ── Downstream: feedback for this session → viewer ─────────────
            fb = feedback.recv() => {
                let Some(fb) = fb else { break };
                let reply = ServerMessage::from(fb);
                if send_message(&mut ws_tx, &reply).await.is_err() {
                    break;
                }
            }
            // ── Upstream: viewer → frames topic ─────────────────────────────
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_upstream_message(session_id, text.as_str(), &bus) {
                            debug!(session = %session_id, error = %e, "frame rejected");
                            let reply = ServerMessage::Error { message: e.to_string() };
                            if send_message(&mut ws_tx, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(session = %session_id, error = %e, "websocket read error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    announce(&bus, EventPayload::SessionClosed { session_id });
    info!(%peer, session = %session_id, "session closed");
    Ok(())
}

/// Publish a lifecycle notice on [`Topic::Sessions`]; nobody listening is fine.
fn announce(bus: &EventBus, payload: EventPayload) {
    if let Err(e) = bus.publish_to(Topic::Sessions, Event::new(SOURCE, payload)) {
        debug!(error = %e, "session notice not delivered");
    }
}

async fn send_message(ws_tx: &mut WsSink, msg: &ServerMessage) -> Result<(), FormError> {
    let json = serde_json::to_string(msg)
        .map_err(|e| FormError::Protocol(format!("serialization error: {e}")))?;
    ws_tx
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| FormError::Transport(format!("WS send error: {e}")))
}

// ---------------------------------------------------------------------------
// Upstream message parser
// ---------------------------------------------------------------------------

/// Parse a viewer text message into a [`FrameRequest`] for `session_id`.
pub(crate) fn parse_frame(session_id: SessionId, text: &str) -> Result<FrameRequest, FormError> {
    let msg: ClientMessage = serde_json::from_str(text)
        .map_err(|e| FormError::Protocol(format!("invalid frame message: {e}")))?;
    let ClientMessage::Frame {
        frame_id,
        activity,
        keypoints,
    } = msg;
    Ok(FrameRequest {
        session_id,
        frame_id,
        activity,
        keypoints,
    })
}

/// Parse a viewer message and publish it on [`Topic::Frames`].
///
/// Fails when the message is malformed or no evaluation worker is listening.
pub(crate) fn handle_upstream_message(
    session_id: SessionId,
    text: &str,
    bus: &EventBus,
) -> Result<(), FormError> {
    let request = parse_frame(session_id, text)?;
    bus.publish_to(
        Topic::Frames,
        Event::new(SOURCE, EventPayload::FrameSubmitted(request)),
    )
    .map(|_| ())
    .map_err(|_| FormError::Channel("evaluation worker unavailable".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

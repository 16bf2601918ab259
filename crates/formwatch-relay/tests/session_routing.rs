//! End-to-end: viewers connect over WebSocket, submit frames, and receive
//! only their own feedback.

use std::net::SocketAddr;
use std::time::Duration;

use formwatch_kernel::Dispatcher;
use formwatch_middleware::{EventBus, Topic, TopicReceiver};
use formwatch_relay::RelayServer;
use formwatch_runtime::EvaluationWorker;
use formwatch_types::EventPayload;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_relay() -> SocketAddr {
    start_relay_on(EventBus::default()).await
}

async fn start_relay_on(bus: EventBus) -> SocketAddr {
    tokio::spawn(EvaluationWorker::new(bus.clone(), Dispatcher::new()).run());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(RelayServer::new(bus).serve(listener));
    addr
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn next_notice(sessions: &mut TopicReceiver) -> EventPayload {
    tokio::time::timeout(Duration::from_secs(2), sessions.recv())
        .await
        .expect("timed out waiting for session notice")
        .expect("sessions topic closed")
        .payload
}

async fn connect(addr: SocketAddr) -> (Client, String) {
    let (mut client, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["type"], "welcome");
    let session_id = welcome["session_id"].as_str().unwrap().to_string();
    (client, session_id)
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

fn squat_keypoints() -> Value {
    json!([
        {"name": "left_shoulder", "x": 0.50, "y": 0.20, "score": 0.9},
        {"name": "right_shoulder", "x": 0.50, "y": 0.20, "score": 0.9},
        {"name": "left_hip", "x": 0.50, "y": 0.50, "score": 0.9},
        {"name": "right_hip", "x": 0.50, "y": 0.50, "score": 0.9},
        {"name": "left_knee", "x": 0.40, "y": 0.80, "score": 0.9},
        {"name": "right_knee", "x": 0.50, "y": 0.80, "score": 0.9},
        {"name": "left_ankle", "x": 0.45, "y": 0.95, "score": 0.9},
        {"name": "right_ankle", "x": 0.60, "y": 0.95, "score": 0.9}
    ])
}

#[tokio::test]
async fn feedback_returns_to_submitting_session_only() {
    let addr = start_relay().await;
    let (mut alice, alice_id) = connect(addr).await;
    let (mut bob, bob_id) = connect(addr).await;
    assert_ne!(alice_id, bob_id);

    send_json(
        &mut alice,
        json!({"type": "frame", "frame_id": 11, "activity": "squat", "keypoints": squat_keypoints()}),
    )
    .await;

    let fb = next_json(&mut alice).await;
    assert_eq!(fb["type"], "feedback");
    assert_eq!(fb["frame_id"], 11);
    assert_eq!(fb["activity"], "squat");
    assert_eq!(fb["issues"][0], "Left knee over toe.");
    assert_eq!(fb["keypoints"], squat_keypoints());

    let leaked = tokio::time::timeout(Duration::from_millis(200), bob.next()).await;
    assert!(leaked.is_err(), "bob must not see alice's feedback");
}

#[tokio::test]
async fn unknown_activity_is_reported_as_feedback() {
    let addr = start_relay().await;
    let (mut client, _) = connect(addr).await;

    send_json(
        &mut client,
        json!({"type": "frame", "activity": "yoga", "keypoints": []}),
    )
    .await;

    let fb = next_json(&mut client).await;
    assert_eq!(fb["type"], "feedback");
    assert_eq!(fb["frame_id"], 0);
    assert_eq!(fb["issues"], json!(["Unknown posture type."]));
}

#[tokio::test]
async fn malformed_message_gets_error_and_session_survives() {
    let addr = start_relay().await;
    let (mut client, _) = connect(addr).await;

    client
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();
    let err = next_json(&mut client).await;
    assert_eq!(err["type"], "error");
    assert!(err["message"].as_str().unwrap().contains("invalid frame message"));

    send_json(
        &mut client,
        json!({"type": "frame", "frame_id": 2, "activity": "desk", "keypoints": []}),
    )
    .await;
    let fb = next_json(&mut client).await;
    assert_eq!(fb["frame_id"], 2);
    assert_eq!(
        fb["issues"],
        json!(["Insufficient keypoints detected for desk posture analysis."])
    );
}

#[tokio::test]
async fn frames_are_answered_in_order() {
    let addr = start_relay().await;
    let (mut client, _) = connect(addr).await;

    for frame_id in 1..=5 {
        send_json(
            &mut client,
            json!({"type": "frame", "frame_id": frame_id, "activity": "squat", "keypoints": squat_keypoints()}),
        )
        .await;
    }
    for frame_id in 1..=5 {
        let fb = next_json(&mut client).await;
        assert_eq!(fb["frame_id"], frame_id);
    }
}

#[tokio::test]
async fn session_lifecycle_is_announced() {
    let bus = EventBus::default();
    let mut sessions = bus.subscribe_to(Topic::Sessions);
    let addr = start_relay_on(bus).await;

    let (mut client, session_id) = connect(addr).await;
    client.close(None).await.unwrap();

    match next_notice(&mut sessions).await {
        EventPayload::SessionOpened { session_id: id } => assert_eq!(id.to_string(), session_id),
        other => panic!("expected SessionOpened, got {other:?}"),
    }
    match next_notice(&mut sessions).await {
        EventPayload::SessionClosed { session_id: id } => assert_eq!(id.to_string(), session_id),
        other => panic!("expected SessionClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_http_gets_health_document() {
    let addr = start_relay().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("formwatch-relay"));
}

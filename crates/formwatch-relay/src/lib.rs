//! `formwatch-relay` – the viewer-facing transport.
//!
//! Boots a lightweight HTTP + WebSocket server (default port `8765`) that:
//!
//! 1. **Accepts** `frame` messages from viewers, each carrying one frame of
//!    keypoints and an activity tag, and publishes them on the event bus.
//!
//! 2. **Routes** evaluation feedback back to the session that submitted the
//!    frame, together with the original keypoints for overlay drawing.
//!
//! 3. **Answers** plain HTTP requests with a JSON health document.
//!
//! # Usage
//!
//! ```rust,no_run
//! use formwatch_kernel::Dispatcher;
//! use formwatch_middleware::EventBus;
//! use formwatch_relay::RelayServer;
//! use formwatch_runtime::EvaluationWorker;
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = EventBus::default();
//!     tokio::spawn(EvaluationWorker::new(bus.clone(), Dispatcher::new()).run());
//!     RelayServer::new(bus)
//!         .run()
//!         .await
//!         .expect("relay server failed");
//! }
//! ```

pub mod server;

pub use server::{DEFAULT_PORT, RelayServer};

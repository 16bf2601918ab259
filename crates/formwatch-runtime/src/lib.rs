//! `formwatch-runtime` – wires the posture engine onto the event bus.
//!
//! # Modules
//!
//! - [`worker`] – [`EvaluationWorker`][worker::EvaluationWorker]: consumes
//!   submitted frames, runs the [`Dispatcher`][formwatch_kernel::Dispatcher]
//!   and delivers feedback into the submitting session's queue.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export
//!   to Jaeger, Grafana Tempo, or any OTLP-compatible collector.

pub mod telemetry;
pub mod worker;

pub use telemetry::{LogFormat, TelemetrySettings, TracerProviderGuard, init_tracing};
pub use worker::{EvaluationWorker, WorkerStats};

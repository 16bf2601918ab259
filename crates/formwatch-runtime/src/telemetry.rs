//! Tracing pipeline for formwatch processes.
//!
//! [`init_tracing`] installs the global subscriber once at startup. Its
//! behaviour is read from the environment into [`TelemetrySettings`]:
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `FORMWATCH_LOG_FORMAT=json` | Newline-delimited JSON logs instead of compact lines. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP/HTTP collector URL (e.g. `http://localhost:4318`); enables span export. |
//!
//! ```rust,no_run
//! // Keep the guard alive until the process exits.
//! let _guard = formwatch_runtime::telemetry::init_tracing("formwatch");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Console log rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Everything [`init_tracing`] needs, resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub filter: String,
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl TelemetrySettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = match lookup("FORMWATCH_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Self {
            filter: lookup("RUST_LOG")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            format,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.is_empty()),
        }
    }
}

/// Install the global subscriber configured from the environment.
///
/// Spans such as the worker's per-frame `evaluate_frame` are exported when
/// an OTLP endpoint is configured. Hold the returned guard for the lifetime
/// of the process; dropping it flushes pending spans.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    init_with(service_name, &TelemetrySettings::from_env())
}

/// Install the global subscriber from explicit settings.
pub fn init_with(service_name: &str, settings: &TelemetrySettings) -> TracerProviderGuard {
    let env_filter = EnvFilter::try_new(&settings.filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let provider = settings
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| build_provider(service_name, endpoint));
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("formwatch")));

    let registry = tracing_subscriber::registry().with(env_filter).with(otel_layer);
    let installed = match settings.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };
    if let Err(e) = installed {
        eprintln!("[formwatch] tracing subscriber already installed: {e}");
    }

    TracerProviderGuard(provider)
}

/// Shuts the span exporter down (flushing it) when dropped.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[formwatch] span exporter shutdown error: {e}");
        }
    }
}

/// `None` when the exporter cannot be built; the reason goes to stderr
/// because no subscriber exists yet.
fn build_provider(service_name: &str, endpoint: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[formwatch] OTLP exporter init failed: {e}"))
        .ok()?;

    Some(
        SdkTracerProvider::builder()
            .with_resource(
                Resource::builder()
                    .with_service_name(service_name.to_string())
                    .build(),
            )
            // Simple exporter: init runs before the Tokio runtime exists.
            .with_simple_exporter(exporter)
            .build(),
    )
}

//! Structured Logging
//!
//! One JSON line per event: timestamp, level, message, the correlation id of
//! the enclosing invocation/session span, and the caller's fields. Fields
//! passed as `Option` are omitted when `None`.
//!
//! ## Usage
//!
//! ```ignore
//! logging::init(&config.logging_settings());
//! let span = logging::invocation_span(&request_id);
//! let _guard = span.enter();
//! tracing::info!(record_count = 5, "Execution started");
//! ```

use tracing::{Span, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::MakeWriter,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::LoggingSettings;
use crate::types::CorrelationId;

/// Map a configured level name to a tracing filter directive.
///
/// Debug output needs both a `DEBUG`/`TRACE` level and the debug flag;
/// without the flag those levels are capped at `info`.
pub fn filter_directive(level: &str, debug: bool) -> &'static str {
    let base = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    };

    match (base, debug) {
        ("debug" | "trace", false) => "info",
        (other, _) => other,
    }
}

/// Install the global JSON subscriber. `RUST_LOG` overrides the configured level.
///
/// Failures (including a subscriber already being installed) are ignored:
/// logging must never abort the caller.
pub fn init(settings: &LoggingSettings) {
    let directive = filter_directive(&settings.level, settings.debug);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer(std::io::stderr))
        .try_init();
}

/// JSON formatting layer; the enclosing span's fields appear under `span`.
fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(writer)
}

/// Span carrying the batch invocation's request id
pub fn invocation_span(request_id: &CorrelationId) -> Span {
    tracing::info_span!("invocation", lambda_request_id = %request_id)
}

/// Span carrying the chat session id
pub fn session_span(session_id: &CorrelationId) -> Span {
    tracing::info_span!("session", session_id = %session_id)
}

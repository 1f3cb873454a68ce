//! Tracing setup and the structured save-error event.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use voicebank_core::LogLevel;

/// Initialize tracing. Production gets JSON lines for the log pipeline;
/// everything else gets a compact console format.
pub fn init_telemetry(environment: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "voicebank=debug,tower_http=debug".into());

    if environment == "production" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(filter)
            .with(console_fmt)
            .init();
    }
}

/// Emit the diagnostic event for a failed save operation. The
/// `fingerprint` field carries the `(operation, error_code)` pair so
/// operators can group occurrences of the same failure.
pub fn save_error_event(
    operation: &str,
    error_code: &str,
    message: &str,
    status: u16,
    level: LogLevel,
) {
    let fingerprint = format!("save_{}_error:{}", operation, error_code);
    match level {
        LogLevel::Debug => tracing::debug!(
            target: "save_error",
            operation,
            error_code,
            fingerprint = %fingerprint,
            status,
            message,
            "save rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            target: "save_error",
            operation,
            error_code,
            fingerprint = %fingerprint,
            status,
            message,
            "save rejected"
        ),
        LogLevel::Error => tracing::error!(
            target: "save_error",
            operation,
            error_code,
            fingerprint = %fingerprint,
            status,
            message,
            "save failed"
        ),
    }
}

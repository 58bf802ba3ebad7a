use tessera_core::LogFormat;
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use super::DEFAULT_LOG_FILTER;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}

/// Initialize the global tracing subscriber.
///
/// Compact console output by default; one JSON object per event with
/// `LogFormat::Json`. Fails if a global subscriber is already installed.
pub fn init_telemetry(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match format {
        LogFormat::Compact => {
            let console_fmt = tracing_subscriber::fmt::layer()
                .event_format(Format::default().compact().with_target(false));
            tracing_subscriber::registry()
                .with(env_filter())
                .with(console_fmt)
                .try_init()?;
        }
        LogFormat::Json => {
            let json_fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(json_fmt)
                .try_init()?;
        }
    }

    tracing::info!(log_format = %format, "Tracing initialized");
    Ok(())
}

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LogFormat, LoggingConfig};
use crate::telemetry::OtelLayer;

/// Install the global subscriber: optional OpenTelemetry layer, `EnvFilter`,
/// and a text or JSON formatter.
///
/// `RUST_LOG` overrides the configured level.
///
/// # Errors
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init_logging(cfg: &LoggingConfig, otel: Option<OtelLayer>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("invalid log level directive '{}'", cfg.level))?;

    let fmt_layer = match cfg.format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(otel)
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to install tracing subscriber")
}

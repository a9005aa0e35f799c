//! OpenTelemetry trace export over OTLP/gRPC.

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracerProvider, Tracer};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Registry;

use crate::config::TracingConfig;

pub type OtelLayer = OpenTelemetryLayer<Registry, Tracer>;

/// Build the OTLP pipeline and return the layer to attach to the subscriber
/// together with the provider to shut down on exit.
///
/// Returns `None` when tracing export is disabled.
///
/// # Errors
/// Returns an error if the exporter cannot be built.
pub fn init_tracing(cfg: &TracingConfig) -> Result<Option<(OtelLayer, SdkTracerProvider)>> {
    if !cfg.enabled {
        return Ok(None);
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(cfg.endpoint.clone())
        .build()
        .context("failed to build OTLP gRPC exporter")?;

    let resource = Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", cfg.service_name.clone())])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(cfg.service_name.clone());
    Ok(Some((OpenTelemetryLayer::new(tracer), provider)))
}

/// Flush pending spans and stop the exporter.
pub fn shutdown_tracing(provider: &SdkTracerProvider) {
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "tracer provider shutdown failed");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracing_builds_nothing() {
        let cfg = TracingConfig::default();
        assert!(init_tracing(&cfg).unwrap().is_none());
    }
}

//! Prometheus metrics for the add endpoints.
//!
//! Collected metrics:
//! - `add_endpoint_requests_total`: endpoint invocations (counter)
//! - `add_endpoint_duration_seconds`: endpoint latency (histogram)
//!
//! Both carry the labels `operation` and `success`. The registry is owned by
//! the gateway state and rendered in text format at `/metrics`.

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

const LABELS: &[&str] = &["operation", "success"];

/// Endpoint metrics registered in a private registry.
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
}

impl GatewayMetrics {
    /// Create and register the endpoint metrics.
    ///
    /// # Errors
    /// Returns an error if a metric cannot be created or registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("add_endpoint_requests_total", "Total endpoint invocations"),
            LABELS,
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "add_endpoint_duration_seconds",
                "Endpoint invocation latency in seconds",
            ),
            LABELS,
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
        })
    }

    /// Record one finished invocation.
    pub fn observe(&self, operation: &str, success: bool, elapsed: Duration) {
        let success = if success { "true" } else { "false" };
        self.requests
            .with_label_values(&[operation, success])
            .inc();
        self.duration
            .with_label_values(&[operation, success])
            .observe(elapsed.as_secs_f64());
    }

    /// Number of recorded invocations for a label pair.
    #[must_use]
    pub fn request_count(&self, operation: &str, success: bool) -> u64 {
        let success = if success { "true" } else { "false" };
        self.requests
            .with_label_values(&[operation, success])
            .get()
    }

    /// Render all metrics in Prometheus text exposition format.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMetrics").finish_non_exhaustive()
    }
}

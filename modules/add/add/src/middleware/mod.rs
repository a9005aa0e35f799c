//! Endpoint middleware
//!
//! Decorators applied around each endpoint. They observe the call and its
//! outcome but never alter the request, the response, or the error.

mod auth;
mod metrics;
mod otel;
mod span;

use crate::endpoints::BoxEndpoint;
use crate::metrics::GatewayMetrics;
use tower::Layer;
use tower::util::BoxCloneSyncService;

pub use auth::{RequireTokenLayer, RequireTokenService};
pub use metrics::{MetricsLayer, MetricsService};
pub use otel::{OtelLayer, OtelService};
pub use span::{TracingLayer, TracingService};

/// One entry of an endpoint middleware chain.
#[derive(Clone, Debug)]
pub enum Middleware {
    /// Fail with `TokenContextMissing` when the call carries no bearer token
    RequireToken,
    /// Record invocation count and latency
    Metrics(GatewayMetrics),
    /// OpenTelemetry span from the global tracer
    Otel,
    /// `tracing` span named `endpoint`
    Tracing,
}

impl Middleware {
    /// Wrap `inner` with this middleware.
    #[must_use]
    pub fn wrap<Req, Resp>(
        &self,
        operation: &'static str,
        inner: BoxEndpoint<Req, Resp>,
    ) -> BoxEndpoint<Req, Resp>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        match self {
            Self::RequireToken => BoxCloneSyncService::new(RequireTokenLayer.layer(inner)),
            Self::Metrics(metrics) => {
                BoxCloneSyncService::new(MetricsLayer::new(operation, metrics.clone()).layer(inner))
            }
            Self::Otel => BoxCloneSyncService::new(OtelLayer::new(operation).layer(inner)),
            Self::Tracing => BoxCloneSyncService::new(TracingLayer::new(operation).layer(inner)),
        }
    }
}

/// Apply `chain` around `endpoint`.
///
/// `chain` is outer-to-inner: the first entry sees the call first and the
/// result last.
pub fn apply_chain<Req, Resp>(
    operation: &'static str,
    endpoint: BoxEndpoint<Req, Resp>,
    chain: &[Middleware],
) -> BoxEndpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    chain
        .iter()
        .rev()
        .fold(endpoint, |inner, mw| mw.wrap(operation, inner))
}

/// Server-side chain: `[RequireToken (optional), Metrics, Otel, Tracing]`.
#[must_use]
pub fn server_chain(require_token: bool, metrics: GatewayMetrics) -> Vec<Middleware> {
    let mut chain = Vec::with_capacity(4);
    if require_token {
        chain.push(Middleware::RequireToken);
    }
    chain.extend([
        Middleware::Metrics(metrics),
        Middleware::Otel,
        Middleware::Tracing,
    ]);
    chain
}

/// Client-side chain: `[Otel, Tracing]`.
#[must_use]
pub fn client_chain() -> Vec<Middleware> {
    vec![Middleware::Otel, Middleware::Tracing]
}

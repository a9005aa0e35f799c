use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level};

use crate::endpoints::Call;
use crate::error::GatewayError;

/// Tower layer that runs each endpoint call inside a `tracing` span
///
/// The span is named `endpoint` and carries:
/// - `operation`: the endpoint name
/// - `duration_ms`: wall time of the call
/// - `error`: set to `true` when the call fails
#[derive(Clone, Debug)]
pub struct TracingLayer {
    operation: &'static str,
}

impl TracingLayer {
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            operation: self.operation,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TracingService<S> {
    inner: S,
    operation: &'static str,
}

impl<S, Req> Service<Call<Req>> for TracingService<S>
where
    S: Service<Call<Req>, Error = GatewayError> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = GatewayError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: Call<Req>) -> Self::Future {
        let operation = self.operation;

        // Call the instance that was poll_ready'd, keep a fresh clone for the next cycle.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let span = tracing::span!(
                Level::INFO,
                "endpoint",
                operation,
                duration_ms = tracing::field::Empty,
                error = tracing::field::Empty,
            );

            let started = Instant::now();
            let result = inner.call(call).instrument(span.clone()).await;
            let elapsed = started.elapsed();

            span.record(
                "duration_ms",
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            );
            if let Err(err) = &result {
                span.record("error", true);
                tracing::debug!(parent: &span, error = %err, "endpoint failed");
            }

            result
        })
    }
}

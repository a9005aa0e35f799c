use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};

use crate::endpoints::Call;
use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;

/// Tower layer that records invocation count and latency per endpoint.
#[derive(Clone, Debug)]
pub struct MetricsLayer {
    operation: &'static str,
    metrics: GatewayMetrics,
}

impl MetricsLayer {
    #[must_use]
    pub fn new(operation: &'static str, metrics: GatewayMetrics) -> Self {
        Self { operation, metrics }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            operation: self.operation,
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MetricsService<S> {
    inner: S,
    operation: &'static str,
    metrics: GatewayMetrics,
}

impl<S, Req> Service<Call<Req>> for MetricsService<S>
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
        let metrics = self.metrics.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let started = Instant::now();
            let result = inner.call(call).await;
            metrics.observe(operation, result.is_ok(), started.elapsed());
            result
        })
    }
}

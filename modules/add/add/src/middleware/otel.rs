use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::{Span as _, Status, Tracer as _};
use tower::{Layer, Service};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::endpoints::Call;
use crate::error::GatewayError;

/// Instrumentation scope of the spans created here.
const TRACER_NAME: &str = "add";

/// Tower layer that opens an OpenTelemetry span per endpoint call
///
/// The span is created from the global tracer, parented on the current
/// `tracing` span's OpenTelemetry context, and tagged with `operation`.
/// Failed calls set the span status to error. With no tracer provider
/// installed the global tracer is a no-op.
#[derive(Clone, Debug)]
pub struct OtelLayer {
    operation: &'static str,
}

impl OtelLayer {
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl<S> Layer<S> for OtelLayer {
    type Service = OtelService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OtelService {
            inner,
            operation: self.operation,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OtelService<S> {
    inner: S,
    operation: &'static str,
}

impl<S, Req> Service<Call<Req>> for OtelService<S>
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
        let parent = tracing::Span::current().context();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut span = global::tracer(TRACER_NAME).start_with_context(operation, &parent);
            span.set_attribute(KeyValue::new("operation", operation));

            let result = inner.call(call).await;

            if let Err(err) = &result {
                span.set_status(Status::error(err.to_string()));
            }
            span.end();

            result
        })
    }
}

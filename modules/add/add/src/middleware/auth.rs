use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::{Layer, Service};

use crate::endpoints::Call;
use crate::error::GatewayError;

/// Tower layer that rejects calls whose context carries no bearer token.
///
/// Only checks presence. Token validation belongs to whatever issued the token.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireTokenLayer;

impl<S> Layer<S> for RequireTokenLayer {
    type Service = RequireTokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireTokenService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct RequireTokenService<S> {
    inner: S,
}

impl<S, Req> Service<Call<Req>> for RequireTokenService<S>
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
        if call.ctx.bearer_token().is_none() {
            return Box::pin(async { Err(GatewayError::TokenContextMissing) });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(call).await })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use add_sdk::RequestCtx;
    use tower::{ServiceExt, service_fn};

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let svc = RequireTokenLayer.layer(service_fn(|call: Call<i64>| async move {
            Ok::<_, GatewayError>(call.request)
        }));
        let err = svc
            .oneshot(Call::new(RequestCtx::new(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::TokenContextMissing));
    }

    #[tokio::test]
    async fn present_token_passes() {
        let svc = RequireTokenLayer.layer(service_fn(|call: Call<i64>| async move {
            Ok::<_, GatewayError>(call.request)
        }));
        let ctx = RequestCtx::new().with_bearer_token("abc");
        assert_eq!(svc.oneshot(Call::new(ctx, 5)).await.unwrap(), 5);
    }
}

//! HTTP server side of the gateway
//!
//! Routes:
//! - `POST /api/add/sum`
//! - `POST /api/add/concat`
//! - `GET /metrics` (Prometheus text format)
//!
//! Every failure on an operation route, whatever the stage, goes through the
//! [`ErrorTranslator`] exactly once and the translator owns the response.

use std::sync::Arc;
use std::time::Duration;

use add_sdk::{AddService, RequestCtx};
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::endpoints::{BoxEndpoint, Call, Endpoints, within_deadline};
use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::middleware::server_chain;
use crate::transport::http::codec::{ResponseMeta, decode_json_request, encode_json_response};
use crate::transport::http::error_encoder::ErrorTranslator;
use crate::transport::http::propagation::set_parent_from_headers;

pub const SUM_PATH: &str = "/api/add/sum";
pub const CONCAT_PATH: &str = "/api/add/concat";
pub const METRICS_PATH: &str = "/metrics";

/// Immutable state shared by every request.
#[derive(Debug)]
pub struct GatewayState {
    endpoints: Endpoints,
    translator: ErrorTranslator,
    metrics: GatewayMetrics,
    body_limit: usize,
    request_timeout: Option<Duration>,
}

impl GatewayState {
    #[must_use]
    pub fn new(
        endpoints: Endpoints,
        translator: ErrorTranslator,
        metrics: GatewayMetrics,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            endpoints,
            translator,
            metrics,
            body_limit: config.body_limit_bytes,
            request_timeout: config.request_timeout(),
        }
    }

    /// Build the state over `service` with the default server middleware chain.
    ///
    /// # Errors
    /// Returns an error if the metrics cannot be registered.
    pub fn build(service: Arc<dyn AddService>, config: &GatewayConfig) -> anyhow::Result<Self> {
        let metrics = GatewayMetrics::new()?;
        let chain = server_chain(config.require_token, metrics.clone());
        Ok(Self::new(
            Endpoints::new(service, &chain),
            ErrorTranslator::new(),
            metrics,
            config,
        ))
    }

    #[must_use]
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    fn request_ctx(&self, headers: &HeaderMap) -> RequestCtx {
        let mut ctx = RequestCtx::new();
        if let Some(token) = extract_bearer_token(headers) {
            ctx = ctx.with_bearer_token(token);
        }
        if let Some(timeout) = self.request_timeout {
            ctx = ctx.with_deadline(Instant::now() + timeout);
        }
        ctx
    }
}

/// Build the gateway router.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(SUM_PATH, post(sum))
        .route(CONCAT_PATH, post(concat))
        .route(METRICS_PATH, get(render_metrics))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
            );
            set_parent_from_headers(&span, request.headers());
            span
        }))
        .with_state(state)
}

async fn sum(State(state): State<Arc<GatewayState>>, headers: HeaderMap, body: Body) -> Response {
    let endpoint = state.endpoints.sum.clone();
    serve(&state, &headers, body, endpoint).await
}

async fn concat(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let endpoint = state.endpoints.concat.clone();
    serve(&state, &headers, body, endpoint).await
}

async fn render_metrics(State(state): State<Arc<GatewayState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Decode, invoke, encode; translate any failure.
async fn serve<Req, Resp>(
    state: &GatewayState,
    headers: &HeaderMap,
    body: Body,
    endpoint: BoxEndpoint<Req, Resp>,
) -> Response
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + ResponseMeta + Send + 'static,
{
    let ctx = state.request_ctx(headers);
    let result: Result<Response, GatewayError> = async {
        let request = within_deadline(
            ctx.deadline(),
            decode_json_request::<Req>(body, state.body_limit),
        )
        .await?;
        let response = endpoint.oneshot(Call::new(ctx, request)).await?;
        encode_json_response(&response)
    }
    .await;

    match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "request failed");
            state.translator.encode(&err)
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn request_ctx_carries_deadline_when_configured() {
        let state = GatewayState::build(
            Arc::new(crate::domain::Service::default()),
            &GatewayConfig::default(),
        )
        .unwrap();
        let ctx = state.request_ctx(&HeaderMap::new());
        assert!(ctx.deadline().is_some());
        assert!(ctx.bearer_token().is_none());

        let state = GatewayState::build(
            Arc::new(crate::domain::Service::default()),
            &GatewayConfig {
                request_timeout_ms: None,
                ..GatewayConfig::default()
            },
        )
        .unwrap();
        assert!(state.request_ctx(&HeaderMap::new()).deadline().is_none());
    }
}

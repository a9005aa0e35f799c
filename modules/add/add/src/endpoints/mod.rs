//! Transport-agnostic endpoints
//!
//! Each operation is a `tower::Service<Call<Req>>` returning either the
//! typed response or a [`GatewayError`]. The set is built once at startup and
//! cloned per request; clones share no mutable state.

use std::future::Future;
use std::sync::Arc;

use add_sdk::{
    AddError, AddService, ConcatRequest, ConcatResponse, RequestCtx, SumRequest, SumResponse,
};
use async_trait::async_trait;
use tokio::time::Instant;
use tower::util::BoxCloneSyncService;
use tower::{ServiceExt, service_fn};

use crate::error::GatewayError;
use crate::middleware::{Middleware, apply_chain};

/// Operation name of the sum endpoint (used for spans and metrics).
pub const SUM: &str = "Sum";
/// Operation name of the concat endpoint (used for spans and metrics).
pub const CONCAT: &str = "Concat";

/// A single endpoint invocation: the per-request context plus the decoded request.
#[derive(Debug, Clone)]
pub struct Call<Req> {
    pub ctx: RequestCtx,
    pub request: Req,
}

impl<Req> Call<Req> {
    pub fn new(ctx: RequestCtx, request: Req) -> Self {
        Self { ctx, request }
    }
}

/// Type-erased endpoint.
pub type BoxEndpoint<Req, Resp> = BoxCloneSyncService<Call<Req>, Resp, GatewayError>;

/// The immutable set of endpoints, one per operation.
#[derive(Clone)]
pub struct Endpoints {
    pub sum: BoxEndpoint<SumRequest, SumResponse>,
    pub concat: BoxEndpoint<ConcatRequest, ConcatResponse>,
}

impl std::fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoints").finish_non_exhaustive()
    }
}

impl Endpoints {
    /// Build the endpoint set over a domain service.
    ///
    /// `chain` lists middleware outer-to-inner: the first entry runs first and
    /// the domain call runs innermost.
    pub fn new(service: Arc<dyn AddService>, chain: &[Middleware]) -> Self {
        Self::from_parts(
            sum_endpoint(Arc::clone(&service)),
            concat_endpoint(service),
            chain,
        )
    }

    /// Wrap already-built innermost endpoints with `chain` (outer-to-inner).
    pub fn from_parts(
        sum: BoxEndpoint<SumRequest, SumResponse>,
        concat: BoxEndpoint<ConcatRequest, ConcatResponse>,
        chain: &[Middleware],
    ) -> Self {
        Self {
            sum: apply_chain(SUM, sum, chain),
            concat: apply_chain(CONCAT, concat, chain),
        }
    }
}

#[async_trait]
impl AddService for Endpoints {
    async fn sum(&self, ctx: &RequestCtx, a: i64, b: i64) -> Result<i64, AddError> {
        let response = self
            .sum
            .clone()
            .oneshot(Call::new(ctx.clone(), SumRequest { a, b }))
            .await?;
        Ok(response.res)
    }

    async fn concat(&self, ctx: &RequestCtx, a: &str, b: &str) -> Result<String, AddError> {
        let request = ConcatRequest {
            a: a.to_owned(),
            b: b.to_owned(),
        };
        let response = self
            .concat
            .clone()
            .oneshot(Call::new(ctx.clone(), request))
            .await?;
        Ok(response.res)
    }
}

fn sum_endpoint(service: Arc<dyn AddService>) -> BoxEndpoint<SumRequest, SumResponse> {
    BoxCloneSyncService::new(service_fn(move |call: Call<SumRequest>| {
        let service = Arc::clone(&service);
        async move {
            let Call { ctx, request } = call;
            let res = within_deadline(ctx.deadline(), service.sum(&ctx, request.a, request.b))
                .await?;
            Ok(SumResponse { res })
        }
    }))
}

fn concat_endpoint(service: Arc<dyn AddService>) -> BoxEndpoint<ConcatRequest, ConcatResponse> {
    BoxCloneSyncService::new(service_fn(move |call: Call<ConcatRequest>| {
        let service = Arc::clone(&service);
        async move {
            let Call { ctx, request } = call;
            let res =
                within_deadline(ctx.deadline(), service.concat(&ctx, &request.a, &request.b))
                    .await?;
            Ok(ConcatResponse { res })
        }
    }))
}

/// Run `fut`, failing with `DeadlineExceeded` once `deadline` passes.
pub(crate) async fn within_deadline<T, E, F>(
    deadline: Option<Instant>,
    fut: F,
) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, E>>,
    GatewayError: From<E>,
{
    match deadline {
        Some(at) => match tokio::time::timeout_at(at, fut).await {
            Ok(result) => result.map_err(GatewayError::from),
            Err(_) => Err(GatewayError::Rpc(tonic::Status::deadline_exceeded(
                "request deadline exceeded",
            ))),
        },
        None => fut.await.map_err(GatewayError::from),
    }
}

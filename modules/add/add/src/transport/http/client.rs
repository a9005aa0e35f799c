//! HTTP client side of the gateway
//!
//! Mirrors the server: encodes the request, calls the remote instance, and
//! decodes either the success payload or the error envelope.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use add_sdk::{
    AddError, AddService, ConcatRequest, ConcatResponse, RequestCtx, SumRequest, SumResponse,
};
use async_trait::async_trait;
use bytes::Bytes;
use http::Uri;
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::Service;
use tower::util::BoxCloneSyncService;
use url::Url;

use crate::endpoints::{Call, Endpoints, within_deadline};
use crate::error::GatewayError;
use crate::middleware::client_chain;
use crate::transport::http::codec::{decode_json_response, encode_json_request};
use crate::transport::http::server::{CONCAT_PATH, SUM_PATH};

type HyperClient = Client<HttpConnector, Full<Bytes>>;

/// [`AddService`] reached over HTTP.
#[derive(Clone, Debug)]
pub struct AddHttpClient {
    base: Url,
    endpoints: Endpoints,
}

impl AddHttpClient {
    /// Create a client for `instance`.
    ///
    /// A bare `host[:port]` gets an `http://` prefix. Only plain `http` is
    /// supported.
    ///
    /// # Errors
    /// `GatewayError::InvalidUrl` when `instance` is not a usable URL.
    pub fn new(instance: &str) -> Result<Self, GatewayError> {
        let base = parse_instance(instance)?;
        let http: HyperClient = Client::builder(TokioExecutor::new()).build_http();

        let sum = HttpEndpoint::<SumRequest, SumResponse>::new(
            http.clone(),
            endpoint_uri(&base, SUM_PATH)?,
        );
        let concat = HttpEndpoint::<ConcatRequest, ConcatResponse>::new(
            http,
            endpoint_uri(&base, CONCAT_PATH)?,
        );

        let endpoints = Endpoints::from_parts(
            BoxCloneSyncService::new(sum),
            BoxCloneSyncService::new(concat),
            &client_chain(),
        );
        Ok(Self { base, endpoints })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl AddService for AddHttpClient {
    async fn sum(&self, ctx: &RequestCtx, a: i64, b: i64) -> Result<i64, AddError> {
        self.endpoints.sum(ctx, a, b).await
    }

    async fn concat(&self, ctx: &RequestCtx, a: &str, b: &str) -> Result<String, AddError> {
        self.endpoints.concat(ctx, a, b).await
    }
}

/// Endpoint performing one HTTP call per invocation.
struct HttpEndpoint<Req, Resp> {
    client: HyperClient,
    uri: Uri,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> HttpEndpoint<Req, Resp> {
    fn new(client: HyperClient, uri: Uri) -> Self {
        Self {
            client,
            uri,
            _marker: PhantomData,
        }
    }
}

impl<Req, Resp> Clone for HttpEndpoint<Req, Resp> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone(), self.uri.clone())
    }
}

impl<Req, Resp> Service<Call<Req>> for HttpEndpoint<Req, Resp>
where
    Req: Serialize + Send + 'static,
    Resp: DeserializeOwned + Send + 'static,
{
    type Response = Resp;
    type Error = GatewayError;
    type Future = Pin<Box<dyn Future<Output = Result<Resp, GatewayError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, call: Call<Req>) -> Self::Future {
        let client = self.client.clone();
        let uri = self.uri.clone();

        Box::pin(async move {
            let Call { ctx, request } = call;
            let outgoing = encode_json_request(uri, &ctx, &request)?;
            within_deadline(ctx.deadline(), async move {
                let response = client
                    .request(outgoing)
                    .await
                    .map_err(|e| GatewayError::Transport(Box::new(e)))?;
                decode_json_response::<Resp, _>(response).await
            })
            .await
        })
    }
}

fn parse_instance(instance: &str) -> Result<Url, GatewayError> {
    let invalid = |reason: String| GatewayError::InvalidUrl {
        url: instance.to_owned(),
        reason,
    };

    let candidate = if instance.starts_with("http") {
        instance.to_owned()
    } else {
        format!("http://{instance}")
    };
    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(url)
}

fn endpoint_uri(base: &Url, path: &str) -> Result<Uri, GatewayError> {
    let invalid = |reason: String| GatewayError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let url = base.join(path).map_err(|e| invalid(e.to_string()))?;
    url.as_str()
        .parse::<Uri>()
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_prefix() {
        let url = parse_instance("localhost:8080").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = parse_instance("http://10.0.0.1:9000/base").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.port(), Some(9000));
    }

    #[test]
    fn malformed_instance_is_rejected() {
        let err = parse_instance("http://[::1").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUrl { ref url, .. } if url == "http://[::1"));
    }

    #[test]
    fn https_instance_is_rejected_up_front() {
        let err = AddHttpClient::new("https://example.com").unwrap_err();
        assert!(matches!(
            err,
            GatewayError::InvalidUrl { ref reason, .. } if reason == "unsupported scheme 'https'"
        ));
    }

    #[test]
    fn endpoint_paths_replace_base_path() {
        let base = parse_instance("http://10.0.0.1:9000/base").unwrap();
        let uri = endpoint_uri(&base, SUM_PATH).unwrap();
        assert_eq!(uri.to_string(), "http://10.0.0.1:9000/api/add/sum");
    }

    #[tokio::test]
    async fn client_construction_does_not_connect() {
        let client = AddHttpClient::new("127.0.0.1:1").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:1/");
    }
}

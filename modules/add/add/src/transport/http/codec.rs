//! JSON codecs binding wire bytes to the operation records
//!
//! Server side decodes requests and encodes responses; client side encodes
//! requests and decodes either the success payload or the error envelope.

use add_errors::{APPLICATION_JSON, DomainError, ErrorRes};
use add_sdk::{ConcatResponse, RequestCtx, SumResponse};
use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::GatewayError;
use crate::transport::http::propagation::inject_current_context;

/// Content type of every JSON payload written by the gateway.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Optional response capabilities honored by [`encode_json_response`].
pub trait ResponseMeta {
    /// Extra headers written before the body.
    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Status code other than 200.
    fn status_code(&self) -> Option<StatusCode> {
        None
    }

    /// Value written in place of the record itself.
    fn wire_body(&self) -> Option<serde_json::Value> {
        None
    }
}

impl ResponseMeta for SumResponse {}
impl ResponseMeta for ConcatResponse {}

// --- server side ---

/// Read the full request body, bounded by `limit`, and parse it as JSON.
///
/// # Errors
/// `GatewayError::Body` when the body cannot be read, `GatewayError::Decode`
/// when it is not valid JSON for `T`.
pub async fn decode_json_request<T: DeserializeOwned>(
    body: Body,
    limit: usize,
) -> Result<T, GatewayError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(GatewayError::Body)?;
    serde_json::from_slice(&bytes).map_err(GatewayError::Decode)
}

/// Write `response` as JSON.
///
/// `204 No Content` short-circuits and writes no body.
///
/// # Errors
/// `GatewayError::Encode` when `response` cannot be serialized.
pub fn encode_json_response<T>(response: &T) -> Result<Response, GatewayError>
where
    T: Serialize + ResponseMeta,
{
    let status = response.status_code().unwrap_or(StatusCode::OK);
    let body = if status == StatusCode::NO_CONTENT {
        Body::empty()
    } else {
        let bytes = match response.wire_body() {
            Some(value) => serde_json::to_vec(&value),
            None => serde_json::to_vec(response),
        };
        Body::from(bytes.map_err(GatewayError::Encode)?)
    };

    let mut out = Response::new(body);
    *out.status_mut() = status;
    out.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    for (name, value) in &response.headers() {
        out.headers_mut().append(name, value.clone());
    }
    Ok(out)
}

// --- client side ---

/// Build an outgoing `POST` carrying `body` as JSON.
///
/// Adds `Authorization: Bearer` when the context holds a token, and the
/// current trace context.
///
/// # Errors
/// `GatewayError::Encode` when `body` cannot be serialized,
/// `GatewayError::Protocol` when the token is not a valid header value.
pub fn encode_json_request<T: Serialize>(
    uri: Uri,
    ctx: &RequestCtx,
    body: &T,
) -> Result<Request<Full<Bytes>>, GatewayError> {
    let bytes = serde_json::to_vec(body).map_err(GatewayError::Encode)?;

    let mut request = Request::new(Full::new(Bytes::from(bytes)));
    *request.method_mut() = Method::POST;
    *request.uri_mut() = uri;
    let headers = request.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    if let Some(token) = ctx.bearer_token() {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| GatewayError::Protocol(format!("invalid bearer token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    inject_current_context(headers);

    Ok(request)
}

/// Decode a response: the typed payload on 2xx, otherwise the error envelope.
///
/// # Errors
/// The decoded upstream error for non-2xx statuses; `GatewayError::Decode`
/// when a success body does not match `T`.
pub async fn decode_json_response<T, B>(response: http::Response<B>) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if !response.status().is_success() {
        return Err(decode_error_response(response).await);
    }
    let bytes = read_body(response.into_body()).await?;
    serde_json::from_slice(&bytes).map_err(GatewayError::Decode)
}

/// Decode an error envelope sent by a peer gateway.
///
/// Bodies that are not `application/json` are a protocol violation.
pub async fn decode_error_response<B>(response: http::Response<B>) -> GatewayError
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains(APPLICATION_JSON) {
        return GatewayError::Protocol(format!(
            "expected JSON formatted error, got Content-Type {content_type}"
        ));
    }

    let bytes = match read_body(response.into_body()).await {
        Ok(bytes) => bytes,
        Err(e) => return e,
    };
    match serde_json::from_slice::<ErrorRes>(&bytes) {
        Ok(envelope) => GatewayError::Upstream {
            status,
            error: DomainError::from(envelope),
        },
        Err(e) => GatewayError::Decode(e),
    }
}

async fn read_body<B>(body: B) -> Result<Bytes, GatewayError>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| GatewayError::Transport(e.into()))
}

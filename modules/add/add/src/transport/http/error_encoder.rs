//! Translation of any gateway failure into an HTTP status and error envelope
//!
//! Classification is ordered, first match wins:
//! 1. RPC status errors use the fixed gRPC to HTTP table
//! 2. Domain errors (including upstream envelopes) keep their message and details
//! 3. Well-known transport errors pick a 4xx status (EOF, JSON, missing token)
//! 4. Everything else is reduced to its display string
//!
//! Errors hidden inside `GatewayError::Other` are downcast and classified with
//! the same order.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use add_errors::{APPLICATION_JSON, DomainError, ErrorItem, ErrorRes, from_error};
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde_json::error::Category;

use crate::error::GatewayError;
use crate::transport::http::status_map::http_status_from_code;

/// Resolved status, message and details of one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<ErrorItem>,
}

impl Translation {
    #[must_use]
    pub fn into_envelope(self) -> ErrorRes {
        ErrorRes::new(self.status, self.message, self.errors)
    }

    fn fallback(display: &str, status: StatusCode) -> Self {
        let errors = from_error(display);
        let message = errors
            .first()
            .map(|item| item.message.clone())
            .unwrap_or_default();
        Self {
            status,
            message,
            errors,
        }
    }
}

/// Overrides the status of a domain error.
///
/// Rules are consulted in registration order; the first `Some` wins and the
/// default status applies when none matches.
pub trait DomainStatusRule: Send + Sync {
    fn status_for(&self, error: &DomainError) -> Option<StatusCode>;
}

impl<F> DomainStatusRule for F
where
    F: Fn(&DomainError) -> Option<StatusCode> + Send + Sync,
{
    fn status_for(&self, error: &DomainError) -> Option<StatusCode> {
        self(error)
    }
}

/// Converts a [`GatewayError`] into the wire error envelope.
#[derive(Clone, Default)]
pub struct ErrorTranslator {
    rules: Vec<Arc<dyn DomainStatusRule>>,
}

impl fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTranslator")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl ErrorTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain status override.
    #[must_use]
    pub fn with_rule(mut self, rule: impl DomainStatusRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Classify `err`. Pure: the same error always yields the same translation.
    #[must_use]
    pub fn translate(&self, err: &GatewayError) -> Translation {
        match err {
            GatewayError::Rpc(status) => rpc(status),
            GatewayError::Domain(domain) => self
                .domain(domain, StatusCode::INTERNAL_SERVER_ERROR)
                .unwrap_or_else(|| Translation::fallback(&err.to_string(), fallback_status(err))),
            GatewayError::Upstream { status, error } => self
                .domain(error, *status)
                .unwrap_or_else(|| Translation::fallback(&error.to_string(), *status)),
            GatewayError::Other(opaque) => self.translate_opaque(opaque),
            other => Translation::fallback(&other.to_string(), fallback_status(other)),
        }
    }

    /// Translate `err` and write it as an HTTP response.
    ///
    /// If the envelope cannot be serialized the response carries the resolved
    /// status and no body.
    pub fn encode(&self, err: &GatewayError) -> Response {
        let translation = self.translate(err);
        let status = translation.status;
        match serde_json::to_vec(&translation.into_envelope()) {
            Ok(body) => (
                status,
                [(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, status = status.as_u16(), "failed to encode error envelope");
                status.into_response()
            }
        }
    }

    fn translate_opaque(&self, err: &anyhow::Error) -> Translation {
        if let Some(inner) = err.downcast_ref::<GatewayError>() {
            return self.translate(inner);
        }
        if let Some(status) = err.downcast_ref::<tonic::Status>() {
            return rpc(status);
        }
        if let Some(domain) = err.downcast_ref::<DomainError>()
            && let Some(translation) = self.domain(domain, StatusCode::INTERNAL_SERVER_ERROR)
        {
            return translation;
        }
        let root: &(dyn StdError + 'static) = err.as_ref();
        let status = well_known_status(root).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Translation::fallback(&err.to_string(), status)
    }

    /// `None` when the error carries neither a message nor details.
    fn domain(&self, err: &DomainError, default: StatusCode) -> Option<Translation> {
        let errors = if err.errors().is_empty() {
            from_error(err.message())
        } else {
            err.errors().to_vec()
        };
        let message = if err.message().is_empty() {
            errors.first()?.message.clone()
        } else {
            err.message().to_owned()
        };
        if message.is_empty() {
            return None;
        }
        let status = self
            .rules
            .iter()
            .find_map(|rule| rule.status_for(err))
            .unwrap_or(default);
        Some(Translation {
            status,
            message,
            errors,
        })
    }
}

/// A status that does not resolve to a 4xx or 5xx (only `Ok`) is reported as 500.
fn rpc(status: &tonic::Status) -> Translation {
    let code = http_status_from_code(status.code());
    let code = if code.is_client_error() || code.is_server_error() {
        code
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Translation {
        status: code,
        message: status.message().to_owned(),
        errors: from_error(status.message()),
    }
}

fn fallback_status(err: &GatewayError) -> StatusCode {
    well_known_status(err).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Status of a well-known transport failure anywhere in the source chain.
fn well_known_status(err: &(dyn StdError + 'static)) -> Option<StatusCode> {
    std::iter::successors(Some(err), |&e| e.source()).find_map(|cause| {
        if let Some(gateway) = cause.downcast_ref::<GatewayError>() {
            return match gateway {
                GatewayError::TokenContextMissing => Some(StatusCode::UNAUTHORIZED),
                GatewayError::Decode(e) => json_status(e),
                _ => None,
            };
        }
        if let Some(e) = cause.downcast_ref::<serde_json::Error>() {
            return json_status(e);
        }
        if let Some(e) = cause.downcast_ref::<io::Error>() {
            return (e.kind() == io::ErrorKind::UnexpectedEof).then_some(StatusCode::BAD_REQUEST);
        }
        if let Some(e) = cause.downcast_ref::<hyper::Error>() {
            return e
                .is_incomplete_message()
                .then_some(StatusCode::BAD_REQUEST);
        }
        if cause.is::<http_body_util::LengthLimitError>() {
            return Some(StatusCode::PAYLOAD_TOO_LARGE);
        }
        None
    })
}

fn json_status(err: &serde_json::Error) -> Option<StatusCode> {
    match err.classify() {
        Category::Syntax | Category::Data | Category::Eof => Some(StatusCode::BAD_REQUEST),
        Category::Io => None,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn json_err(input: &str) -> serde_json::Error {
        serde_json::from_str::<add_sdk::SumRequest>(input).unwrap_err()
    }

    #[test]
    fn rpc_status_uses_table_and_message() {
        let t = ErrorTranslator::new()
            .translate(&GatewayError::Rpc(tonic::Status::invalid_argument("a must be positive")));
        assert_eq!(t.status, StatusCode::BAD_REQUEST);
        assert_eq!(t.message, "a must be positive");
        assert_eq!(t.errors, vec![ErrorItem::new("a must be positive")]);
    }

    #[test]
    fn domain_error_defaults_to_500_and_keeps_details() {
        let err = DomainError::new("integer overflow")
            .with_error(ErrorItem::new("too big").with_field("a"));
        let t = ErrorTranslator::new().translate(&GatewayError::Domain(err));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.message, "integer overflow");
        assert_eq!(t.errors, vec![ErrorItem::new("too big").with_field("a")]);
    }

    #[test]
    fn domain_rule_overrides_status() {
        let translator = ErrorTranslator::new().with_rule(|e: &DomainError| {
            (e.message() == "integer overflow").then_some(StatusCode::UNPROCESSABLE_ENTITY)
        });
        let t = translator.translate(&GatewayError::Domain(DomainError::new("integer overflow")));
        assert_eq!(t.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(t.errors, vec![ErrorItem::new("integer overflow")]);

        let t = translator.translate(&GatewayError::Domain(DomainError::new("other")));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_error_without_message_keeps_details() {
        let err = DomainError::new("")
            .with_error(ErrorItem::new("a is required").with_field("a"))
            .with_error(ErrorItem::new("b is required").with_field("b"));
        let t = ErrorTranslator::new().translate(&GatewayError::Domain(err));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.message, "a is required");
        assert_eq!(
            t.errors,
            vec![
                ErrorItem::new("a is required").with_field("a"),
                ErrorItem::new("b is required").with_field("b"),
            ]
        );
    }

    #[test]
    fn empty_domain_error_falls_back() {
        let t = ErrorTranslator::new().translate(&GatewayError::Domain(DomainError::new("")));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.errors.len(), 1);
        assert_eq!(t.message, t.errors[0].message);
    }

    #[test]
    fn ok_rpc_status_is_never_a_success() {
        let t = ErrorTranslator::new()
            .translate(&GatewayError::Rpc(tonic::Status::new(tonic::Code::Ok, "weird")));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.message, "weird");
    }

    #[test]
    fn upstream_keeps_remote_status() {
        let t = ErrorTranslator::new().translate(&GatewayError::Upstream {
            status: StatusCode::NOT_FOUND,
            error: DomainError::new("no such thing"),
        });
        assert_eq!(t.status, StatusCode::NOT_FOUND);
        assert_eq!(t.message, "no such thing");
    }

    #[test]
    fn malformed_json_is_400() {
        for input in ["not-json", r#"{"a":"x","b":1}"#, r#"{"a":1"#] {
            let t = ErrorTranslator::new().translate(&GatewayError::Decode(json_err(input)));
            assert_eq!(t.status, StatusCode::BAD_REQUEST, "input {input}");
            assert!(!t.errors.is_empty());
            assert_eq!(t.message, t.errors[0].message);
        }
    }

    #[test]
    fn missing_token_is_401() {
        let t = ErrorTranslator::new().translate(&GatewayError::TokenContextMissing);
        assert_eq!(t.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            t.message,
            "token up for parsing was not passed through the context"
        );
    }

    #[test]
    fn unexpected_eof_is_400() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected EOF");
        let t = ErrorTranslator::new().translate(&GatewayError::Body(axum::Error::new(eof)));
        assert_eq!(t.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn opaque_errors_are_downcast() {
        let translator = ErrorTranslator::new();

        let t = translator.translate(&GatewayError::Other(anyhow::Error::new(
            tonic::Status::not_found("gone"),
        )));
        assert_eq!(t.status, StatusCode::NOT_FOUND);

        let t = translator.translate(&GatewayError::Other(anyhow::Error::new(
            GatewayError::TokenContextMissing,
        )));
        assert_eq!(t.status, StatusCode::UNAUTHORIZED);

        let t = translator.translate(&GatewayError::Other(anyhow::Error::new(DomainError::new(
            "nope",
        ))));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.message, "nope");

        let t = translator.translate(&GatewayError::Other(
            anyhow::Error::new(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"))
                .context("reading body"),
        ));
        assert_eq!(t.status, StatusCode::BAD_REQUEST);
        assert_eq!(t.message, "reading body");
    }

    #[test]
    fn unknown_errors_are_500_with_display_string() {
        let t = ErrorTranslator::new().translate(&GatewayError::Other(anyhow::anyhow!("boom")));
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.message, "boom");
        assert_eq!(t.errors, vec![ErrorItem::new("boom")]);
    }

    #[test]
    fn errors_are_never_empty() {
        let translator = ErrorTranslator::new();
        let inputs = [
            GatewayError::Rpc(tonic::Status::internal("")),
            GatewayError::Domain(DomainError::new("")),
            GatewayError::Protocol(String::new()),
            GatewayError::Other(anyhow::anyhow!("")),
        ];
        for err in &inputs {
            let envelope = translator.translate(err).into_envelope();
            assert!(!envelope.error.errors.is_empty(), "{err:?}");
        }
    }

    #[test]
    fn translation_is_idempotent() {
        let translator = ErrorTranslator::new();
        let err = GatewayError::Decode(json_err("not-json"));
        let first = serde_json::to_vec(&translator.translate(&err).into_envelope()).unwrap();
        let second = serde_json::to_vec(&translator.translate(&err).into_envelope()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn encode_writes_json_envelope() {
        let response = ErrorTranslator::new().encode(&GatewayError::TokenContextMissing);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            APPLICATION_JSON
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let envelope: ErrorRes = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.code(), StatusCode::UNAUTHORIZED);
        assert_eq!(envelope.error.errors.len(), 1);
    }
}

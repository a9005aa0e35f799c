use add_errors::DomainError;
use add_sdk::AddError;
use http::StatusCode;
use thiserror::Error;

/// Every failure the gateway can observe, tagged at the point it happens.
///
/// The HTTP error translator classifies these in a fixed order; see
/// [`crate::transport::http::ErrorTranslator`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Structured status from an RPC-style call
    #[error(transparent)]
    Rpc(#[from] tonic::Status),

    /// Business rule violation raised by the domain service
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Error envelope received from a remote gateway
    #[error("upstream returned {status}: {error}")]
    Upstream {
        status: StatusCode,
        error: DomainError,
    },

    /// A protected endpoint ran without a bearer token in its context
    #[error("token up for parsing was not passed through the context")]
    TokenContextMissing,

    /// Request body could not be read
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// Body is not valid JSON for the expected shape
    #[error(transparent)]
    Decode(serde_json::Error),

    /// Response could not be serialized
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    /// Network or connection failure on an outgoing call
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Remote instance address could not be turned into a URL
    #[error("invalid instance URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Peer broke the wire contract (e.g. non-JSON error body)
    #[error("{0}")]
    Protocol(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AddError> for GatewayError {
    fn from(err: AddError) -> Self {
        match err {
            AddError::Domain(e) => GatewayError::Domain(e),
            AddError::Remote(status) => GatewayError::Rpc(status),
            AddError::Transport(msg) => GatewayError::Other(anyhow::anyhow!(msg)),
        }
    }
}

impl From<GatewayError> for AddError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Domain(e) | GatewayError::Upstream { error: e, .. } => AddError::Domain(e),
            GatewayError::Rpc(status) => AddError::Remote(status),
            other => AddError::Transport(other.to_string()),
        }
    }
}

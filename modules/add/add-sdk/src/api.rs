//! API trait and error types for the add service

use add_errors::DomainError;
use async_trait::async_trait;

use crate::context::RequestCtx;

/// Add service API trait
///
/// Implemented by the in-process domain service, by the endpoint set that
/// wraps it, and by the HTTP client that reaches a remote instance.
#[async_trait]
pub trait AddService: Send + Sync {
    /// Add two numbers and return the sum.
    async fn sum(&self, ctx: &RequestCtx, a: i64, b: i64) -> Result<i64, AddError>;

    /// Concatenate two strings.
    async fn concat(&self, ctx: &RequestCtx, a: &str, b: &str) -> Result<String, AddError>;
}

/// Error type for add service operations
#[derive(thiserror::Error, Debug)]
pub enum AddError {
    /// Business rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A remote/RPC backend answered with a status error
    #[error("remote service error: {0}")]
    Remote(#[from] tonic::Status),

    /// The call could not be delivered or its answer could not be read
    #[error("transport error: {0}")]
    Transport(String),
}

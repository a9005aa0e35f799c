//! The error envelope written for every failed request (pure data model)
//!
//! Wire shape, in both directions:
//! `{"error": {"code": <int>, "message": "<string>", "errors": [{"message": "<string>"}, ...]}}`

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::DomainError;
use crate::item::{ErrorItem, from_error};

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16
///
/// Any `u16` is accepted; codes outside 100..=999 read as 500 so a peer's
/// message survives a bogus code.
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    Ok(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
}

/// Top-level error envelope, always nested under a single `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRes {
    pub error: ErrorResItem,
}

/// Body of the error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResItem {
    /// The HTTP status code of this response, serialized as u16.
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub code: StatusCode,
    /// Top-level human-readable message.
    pub message: String,
    /// Ordered structured details, never empty.
    pub errors: Vec<ErrorItem>,
}

impl ErrorRes {
    /// Build an envelope. An empty `errors` sequence is replaced by a single
    /// entry derived from `message`.
    pub fn new(code: StatusCode, message: impl Into<String>, errors: Vec<ErrorItem>) -> Self {
        let message = message.into();
        let errors = if errors.is_empty() {
            from_error(&message)
        } else {
            errors
        };
        Self {
            error: ErrorResItem {
                code,
                message,
                errors,
            },
        }
    }

    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.error.code
    }
}

impl From<ErrorRes> for DomainError {
    fn from(res: ErrorRes) -> Self {
        DomainError::new(res.error.message).with_errors(res.error.errors)
    }
}

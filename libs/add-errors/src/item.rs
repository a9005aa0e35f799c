//! Structured sub-errors carried inside the error envelope

use serde::{Deserialize, Serialize};

/// A single structured error detail, optionally bound to a request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorItem {
    /// Field path, e.g. "a" or "user.email"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable message describing the error
    pub message: String,
}

impl ErrorItem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Parse a flat error string into a sub-error sequence.
///
/// The result always holds exactly one element whose message is `message`,
/// so callers may rely on `[0]` being the surfaced error.
#[must_use]
pub fn from_error(message: &str) -> Vec<ErrorItem> {
    vec![ErrorItem::new(message)]
}

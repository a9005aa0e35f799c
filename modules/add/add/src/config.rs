//! Gateway configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::DEFAULT_MAX_CONCAT_LEN;

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Settings of the HTTP gateway and the endpoints behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Reject calls without `Authorization: Bearer` with 401.
    pub require_token: bool,
    /// Deadline applied to each request; `None` disables it.
    pub request_timeout_ms: Option<u64>,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
    /// Maximum length of a concatenation result.
    pub max_concat_len: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            require_token: false,
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            max_concat_len: DEFAULT_MAX_CONCAT_LEN,
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

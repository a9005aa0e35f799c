//! Domain service for the add module

use add_errors::{DomainError, ErrorItem};
use add_sdk::{AddError, AddService, RequestCtx};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Default upper bound on the length of a concatenation result.
pub const DEFAULT_MAX_CONCAT_LEN: usize = 1024;

/// In-process implementation of [`AddService`].
#[derive(Debug, Clone)]
pub struct Service {
    max_concat_len: usize,
}

impl Default for Service {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCAT_LEN)
    }
}

impl Service {
    #[must_use]
    pub fn new(max_concat_len: usize) -> Self {
        Self { max_concat_len }
    }
}

#[async_trait]
impl AddService for Service {
    #[instrument(skip(self, _ctx))]
    async fn sum(&self, _ctx: &RequestCtx, a: i64, b: i64) -> Result<i64, AddError> {
        let res = a.checked_add(b).ok_or_else(|| {
            DomainError::new("integer overflow")
                .with_error(ErrorItem::new(format!("{a} + {b} does not fit in 64 bits")))
        })?;
        debug!(res, "sum computed");
        Ok(res)
    }

    #[instrument(skip(self, _ctx, a, b), fields(a_len = a.len(), b_len = b.len()))]
    async fn concat(&self, _ctx: &RequestCtx, a: &str, b: &str) -> Result<String, AddError> {
        let len = a.len() + b.len();
        if len > self.max_concat_len {
            return Err(DomainError::new("result exceeds maximum size")
                .with_error(ErrorItem::new(format!(
                    "{len} bytes exceeds the limit of {} bytes",
                    self.max_concat_len
                )))
                .into());
        }
        Ok(format!("{a}{b}"))
    }
}

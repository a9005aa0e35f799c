use std::fmt;

use tokio::time::Instant;

/// Per-call context.
///
/// Carries the bearer token extracted from the inbound transport and the
/// deadline the call must complete by. Built for a single request and never
/// shared across requests.
#[derive(Clone, Default)]
pub struct RequestCtx {
    bearer_token: Option<String>,
    deadline: Option<Instant>,
}

impl RequestCtx {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl fmt::Debug for RequestCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCtx")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn debug_redacts_token() {
        let ctx = RequestCtx::new().with_bearer_token("s3cr3t");
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn default_context_is_anonymous() {
        let ctx = RequestCtx::new();
        assert!(ctx.bearer_token().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn deadline_is_kept() {
        let at = Instant::now() + Duration::from_secs(5);
        let ctx = RequestCtx::new().with_deadline(at);
        assert_eq!(ctx.deadline(), Some(at));
    }
}
